//! License headers checked from files on disk

use std::fs;
use std::sync::Arc;

use kwalitee::core::models::FindingCode;
use kwalitee::core::services::{
    AnalyzerRegistry, CheckOptions, CommentStyle, FileChecker, LicenseOptions, check_license,
};
use tempfile::TempDir;

const HEADER_2014: &str = "# -*- coding: utf-8 -*-\n\
    #\n\
    # This file is part of Invenio.\n\
    # Copyright (C) 2013, 2014 CERN.\n\
    #\n\
    # Invenio is free software; you can redistribute it and/or\n\
    # modify it under the terms of the GNU General Public License.\n\
    #\n\
    # Invenio is distributed in the hope that it will be useful.\n\
    #\n\
    # You should have received a copy of the GNU General Public License\n\
    # along with Invenio; if not, write to the Free Software Foundation.\n\
    \n\
    import os\n";

fn options(year: i32) -> LicenseOptions {
    LicenseOptions {
        year,
        style: CommentStyle::Hash,
        ..LicenseOptions::default()
    }
}

fn checker(options: CheckOptions) -> FileChecker {
    FileChecker::new(options, Arc::new(AnalyzerRegistry::new())).unwrap().with_year(2015)
}

#[test]
fn outdated_year_is_reported_at_the_copyright_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.py");
    fs::write(&path, HEADER_2014).unwrap();

    let findings = check_license(&path, &options(2015)).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].line, 4);
    assert_eq!(findings[0].code, FindingCode::YearOutdated);
    assert_eq!(findings[0].args, ["2015", "2014"]);
}

#[test]
fn current_year_passes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.py");
    fs::write(&path, HEADER_2014).unwrap();

    assert!(check_license(&path, &options(2014)).unwrap().is_empty());
}

#[test]
fn invalid_utf8_becomes_a_finding() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.py");
    fs::write(&path, b"# -*- coding: utf-8 -*-\n# \xff\xfe\n").unwrap();

    let findings = check_license(&path, &options(2015)).unwrap();

    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].to_string(), "2: L190 file cannot be decoded as utf-8");
}

#[test]
fn ignored_codes_are_dropped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("module.py");
    fs::write(&path, HEADER_2014).unwrap();
    let options = LicenseOptions {
        ignore: ["L102".to_string()].into_iter().collect(),
        ..options(2015)
    };

    assert!(check_license(&path, &options).unwrap().is_empty());
}

#[test]
fn checker_skips_excluded_paths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf.py");
    fs::write(&path, "import os\n").unwrap();
    let checker = checker(CheckOptions {
        excludes: vec!["docs/".to_string()],
        check_analyzers: false,
        ..CheckOptions::default()
    });

    assert_eq!(checker.check_file(&path, "docs/conf.py").unwrap(), None);
    let findings = checker.check_file(&path, "invenio/conf.py").unwrap().unwrap();
    assert_eq!(findings[0].code, FindingCode::CopyrightMissing);
}

#[test]
fn checker_uses_block_comments_for_javascript() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.js");
    fs::write(&path, "/*\n * Copyright (C) 2015 CERN.\n */\n\nvar x;\n").unwrap();
    let checker = checker(CheckOptions {
        check_analyzers: false,
        ..CheckOptions::default()
    });

    let findings = checker.check_file(&path, "static/app.js").unwrap().unwrap();

    assert_eq!(
        findings.iter().map(|f| f.code.clone()).collect::<Vec<_>>(),
        [FindingCode::LicenseMissing]
    );
}

#[test]
fn unknown_extensions_are_not_license_checked() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("README.rst");
    fs::write(&path, "Invenio\n=======\n").unwrap();
    let checker = checker(CheckOptions {
        check_analyzers: false,
        ..CheckOptions::default()
    });

    assert_eq!(checker.check_file(&path, "README.rst").unwrap(), Some(Vec::new()));
}
