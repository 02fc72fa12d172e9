use std::{
    fs,
    path::{Path, PathBuf},
};

use kiln_shared::log::LevelFilter;

pub use spectral;

const TEST_RESULT_FOLDER: &str = "test_results";

/// Installs a logger that prints everything. Can be called from every test, only the first call has an effect.
pub fn setup_logger() {
    let _ = simple_logger::SimpleLogger::new().with_level(LevelFilter::Trace).init();
}

/// Creates an empty folder in `test_results` for the given test function to which debug output can be written.
///
/// The folder is named after the function, so call it with [`kiln_shared::function_name!`].
pub fn create_test_result_folder_for_function(function_name: &str) -> PathBuf {
    let folder = Path::new(TEST_RESULT_FOLDER).join(function_name.replace("::", "."));
    println!(
        "The files for debugging this test will be written to the following folder: {}",
        folder.to_string_lossy()
    );
    let _ = fs::remove_dir_all(&folder);
    fs::create_dir_all(&folder).expect("Failed to create the test result folder");
    folder
}

/// Creates an empty file for every relative path in `paths` below `root`. Missing parent directories are created.
///
/// This is enough to lay out an asset tree since the content of the frames is never read.
pub fn create_files<'a>(root: &Path, paths: impl IntoIterator<Item = &'a str>) {
    for path in paths {
        let path = root.join(path);
        let parent = path.parent().expect("file path has no parent");
        fs::create_dir_all(parent).unwrap_or_else(|err| panic!("Failed to create directory \"{}\": {err}", parent.display()));
        fs::write(&path, b"").unwrap_or_else(|err| panic!("Failed to create file \"{}\": {err}", path.display()));
    }
}

/// Creates every relative directory in `paths` below `root`.
pub fn create_dirs<'a>(root: &Path, paths: impl IntoIterator<Item = &'a str>) {
    for path in paths {
        let path = root.join(path);
        fs::create_dir_all(&path).unwrap_or_else(|err| panic!("Failed to create directory \"{}\": {err}", path.display()));
    }
}
