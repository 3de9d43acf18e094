pub const LEVEL_FILE_EXTENSION: &str = ".yol";

/// One selectable level: a display label and the identifier the game accepts
/// as its `--level` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelOption {
    pub label: String,
    pub identifier: String,
}

impl LevelOption {
    /// Derives the option for a level resource name.
    ///
    /// A trailing `.yol` is stripped; a name without it is kept as is. Returns
    /// `None` when nothing would be left to pass to the game.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let identifier = identifier_from_filename(filename);
        if identifier.is_empty() {
            return None;
        }
        Some(Self {
            label: label_from_identifier(identifier),
            identifier: identifier.to_string(),
        })
    }

    /// The resource name the game loads for this level.
    pub fn filename(&self) -> String {
        format!("{}{LEVEL_FILE_EXTENSION}", self.identifier)
    }
}

fn identifier_from_filename(filename: &str) -> &str {
    filename
        .strip_suffix(LEVEL_FILE_EXTENSION)
        .unwrap_or(filename)
}

fn label_from_identifier(identifier: &str) -> String {
    identifier.replace('_', " ")
}
