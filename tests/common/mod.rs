// tests/common/mod.rs

//! Shared helpers for building rock fixtures in memory.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

/// An entry to place in a fixture container
pub enum Entry<'a> {
    Dir(&'a str),
    File(&'a str, &'a [u8]),
}

/// Build a ZIP container from the given entries, in order.
pub fn build_zip(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in entries {
        match entry {
            Entry::Dir(name) => writer.add_directory(name.to_string(), options).unwrap(),
            Entry::File(name, content) => {
                writer.start_file(name.to_string(), options).unwrap();
                writer.write_all(content).unwrap();
            }
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Build a minimal rock: base directory, rockspec, and extra files under it.
pub fn build_rock(base: &str, rockspec: &str, files: &[(&str, &[u8])]) -> Vec<u8> {
    let base_dir = format!("{}/", base);
    let name = base.split('-').next().unwrap_or(base);
    let rockspec_path = format!("{}{}.rockspec", base_dir, name);
    let file_paths: Vec<String> = files
        .iter()
        .map(|(path, _)| format!("{}{}", base_dir, path))
        .collect();

    let mut entries = vec![
        Entry::Dir(&base_dir),
        Entry::File(&rockspec_path, rockspec.as_bytes()),
    ];
    for (path, (_, content)) in file_paths.iter().zip(files) {
        entries.push(Entry::File(path, *content));
    }

    build_zip(&entries)
}
