/// A file picked by the user, carried verbatim to the upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PickedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Options forwarded to the processing service alongside the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOptions {
    pub strategy: String,
    pub model: String,
    pub infer_tables: bool,
    pub extract_images: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            strategy: "hi_res".to_string(),
            model: "yolox".to_string(),
            infer_tables: true,
            extract_images: true,
        }
    }
}

/// Everything a submission needs: the file plus the options in effect when it
/// was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub file: PickedFile,
    pub options: ProcessingOptions,
}

/// Holds the current pick and options. Accepts anything; no validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionStore {
    file: Option<PickedFile>,
    options: ProcessingOptions,
    defaults: ProcessingOptions,
}

impl SelectionStore {
    pub fn with_defaults(defaults: ProcessingOptions) -> Self {
        Self {
            file: None,
            options: defaults.clone(),
            defaults,
        }
    }

    /// Replaces the current pick. Returns `false` (and changes nothing) when no
    /// file was provided.
    pub fn select(&mut self, file: Option<PickedFile>) -> bool {
        match file {
            Some(file) => {
                self.file = Some(file);
                true
            }
            None => false,
        }
    }

    pub fn set_options(&mut self, options: ProcessingOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &ProcessingOptions {
        &self.options
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file.as_ref().map(|file| file.name.as_str())
    }

    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.file.as_ref().map(|file| Selection {
            file: file.clone(),
            options: self.options.clone(),
        })
    }

    /// Drops the pick and restores the default options.
    pub fn clear(&mut self) {
        self.file = None;
        self.options = self.defaults.clone();
    }
}
