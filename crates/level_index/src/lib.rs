mod index;
mod option;

pub use index::{
    parse_level_index, resolve_level_options, IndexShapeError, LevelIndexError,
    LEVEL_INDEX_RELATIVE_PATH,
};
pub use option::{LevelOption, LEVEL_FILE_EXTENSION};
