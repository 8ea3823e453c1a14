#![allow(dead_code)]

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const SRCML_ROOT_OPEN: &str = r#"<unit xmlns="http://www.srcML.org/srcML/src" xmlns:cpp="http://www.srcML.org/srcML/cpp" revision="1.0.0">"#;

/// Installs a test logger once per binary; run with `RUST_LOG=debug` to see
/// why a count failed.
pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A srcML document on disk, removed when dropped.
pub struct SrcmlFile {
    file: NamedTempFile,
}

impl SrcmlFile {
    pub fn with_contents(contents: &[u8]) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(contents)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn path_str(&self) -> &str {
        self.file
            .path()
            .to_str()
            .expect("temp file paths are valid UTF-8")
    }
}

/// An archive whose outer unit wraps one nested unit per file name.
pub fn archive(filenames: &[&str]) -> String {
    let mut xml = String::from(SRCML_ROOT_OPEN);
    for name in filenames {
        xml.push_str(&format!(
            r#"<unit filename="{name}"><function><type><name>int</name></type> <name>f</name><parameter_list>()</parameter_list> <block>{{<block_content/>}}</block></function></unit>"#
        ));
    }
    xml.push_str("</unit>");
    xml
}
