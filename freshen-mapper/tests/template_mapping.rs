//! Destination template tests for `freshen-mapper`.

use std::fs;
use std::path::{Path, PathBuf};

use freshen_mapper::{MapperError, TemplateMapper};
use rstest::rstest;
use tempfile::TempDir;

#[rstest]
#[case("{{ dir }}/{{ stem }}.css", "styles/site.scss", "styles/site.css")]
#[case("{{ path }}.gz", "assets/app.js", "assets/app.js.gz")]
#[case("{{ stem }}.min{{ ext }}", "app.js", "app.min.js")]
#[case("build/{{ name }}", "src/lib/util.ts", "build/util.ts")]
#[case("/abs/out/{{ name }}", "src/a.txt", "/abs/out/a.txt")]
fn renders_destination(#[case] template: &str, #[case] source: &str, #[case] expected: &str) {
    let mapper = TemplateMapper::new(template).expect("compile");
    let out = mapper.render(Path::new(source)).expect("render");
    assert_eq!(out, PathBuf::from(expected));
}

#[test]
fn filters_are_available() {
    let mapper = TemplateMapper::new("{{ stem | upper }}{{ ext }}").expect("compile");
    let out = mapper.render(Path::new("docs/readme.md")).expect("render");
    assert_eq!(out, PathBuf::from("README.md"));
}

#[test]
fn template_file_is_trimmed() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("dest.tera");
    fs::write(&path, "out/{{ stem }}.html\n").expect("write template");

    let mapper = TemplateMapper::from_file(&path).expect("load");
    assert_eq!(mapper.template(), "out/{{ stem }}.html");
    let out = mapper.render(Path::new("pages/index.md")).expect("render");
    assert_eq!(out, PathBuf::from("out/index.html"));
}

#[test]
fn missing_template_file_is_io_error() {
    let dir = TempDir::new().expect("tempdir");
    let err = TemplateMapper::from_file(&dir.path().join("nope.tera"))
        .err()
        .expect("missing file");
    assert!(matches!(err, MapperError::Io { .. }));
}
