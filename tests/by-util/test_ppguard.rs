// This file is part of the ppguard package.
//
// For the full copyright and license information, please view the LICENSE
// file that was distributed with this source code.

// spell-checker:ignore (ToDO) ifndef gtest nums

use crate::common::util::TestScenario;
use regex::Regex;

static FIXTURE: &str = "test.cpp";

#[test]
fn test_pre_guards_every_include() {
    let result = new_ucmd!()
        .args(&["-s", "pre", "-S", "cat", "-o", "-", FIXTURE])
        .succeeds();
    result.no_stderr();
    let pattern = Regex::new(concat!(
        r"^int (\d+);\n",
        r"/\* (\d+)#include <gtest/gtest\.h> \*/\n",
        r"\n",
        r"#ifndef COVERAGE\n",
        r"import lib;\n",
        r"#else\n",
        r"int (\d+);\n",
        r#"/\* (\d+)#include "lib\.cpp" \*/\n"#,
        r"#endif\n",
        r"\n",
        r#"TEST\(LibTest, HelloWorld\) \{ EXPECT_EQ\(greet\(\), "Hello, World!"\); \}\n$"#
    ))
    .unwrap();
    let caps = pattern
        .captures(result.stdout_str())
        .unwrap_or_else(|| panic!("pre output did not match:\n{}", result.stdout_str()));
    assert_eq!(caps[1], caps[2], "first pair of tags differs");
    assert_eq!(caps[3], caps[4], "second pair of tags differs");
}

#[test]
fn test_post_alone_is_the_identity() {
    new_ucmd!()
        .args(&["-s", "post", "-S", "cat", "-o", "-", FIXTURE])
        .succeeds()
        .stdout_only_fixture(FIXTURE);
}

#[test]
fn test_pre_then_post_round_trips() {
    new_ucmd!()
        .args(&["-s", "pre", "post", "-S", "cat", "-o", "-", FIXTURE])
        .succeeds()
        .stdout_only_fixture(FIXTURE);
}

#[test]
fn test_piping_pre_into_post_round_trips() {
    let scene = TestScenario::new(util_name!());
    let pre = scene
        .ucmd()
        .args(&["-s", "pre", "-S", "cat", "-o", "-", FIXTURE])
        .succeeds();
    pre.no_stderr();
    scene
        .ucmd()
        .args(&["-s", "post", "-S", "cat", "-o", "-", "-"])
        .pipe_in(pre.stdout_str())
        .succeeds()
        .stdout_only_fixture(FIXTURE);
}

#[cfg(unix)]
#[test]
fn test_mid_with_an_identity_script() {
    new_ucmd!()
        .args(&["-s", "mid", "-S", "cat", "-o", "-", FIXTURE])
        .succeeds()
        .stdout_only_fixture(FIXTURE);
}

#[cfg(unix)]
#[test]
fn test_full_with_an_identity_script() {
    new_ucmd!()
        .args(&["-S", "cat", "-o", "-", FIXTURE])
        .succeeds()
        .stdout_only_fixture(FIXTURE);
}

#[cfg(unix)]
#[test]
fn test_full_with_a_comment_stripping_script() {
    // Deleting the commented pragmas leaves lone markers, which the post
    // stage silently consumes together with the includes they guarded.
    new_ucmd!()
        .args(&["-S", r"grep -v '^/\* '", "-o", "-", FIXTURE])
        .succeeds()
        .stdout_only(
            "\n#ifndef COVERAGE\nimport lib;\n#else\n#endif\n\n\
             TEST(LibTest, HelloWorld) { EXPECT_EQ(greet(), \"Hello, World!\"); }\n",
        );
}

#[cfg(unix)]
#[test]
fn test_a_failing_preprocessor_is_diagnosed_with_its_pid() {
    let result = new_ucmd!().args(&["-S", "false", FIXTURE]).fails();
    result.code_is(1);
    let diagnostic = Regex::new(r"Subprocess '\d+' exited with non-zero code: 1").unwrap();
    assert!(
        diagnostic.is_match(result.stderr_str()),
        "stderr: {}",
        result.stderr_str()
    );
}

#[test]
fn test_reading_from_stdin() {
    let scene = TestScenario::new(util_name!());
    let content = scene.fixtures.read(FIXTURE);
    scene
        .ucmd()
        .args(&["-s", "post", "-S", "cat", "-o", "-", "-"])
        .pipe_in(content.as_str())
        .succeeds()
        .stdout_only_fixture(FIXTURE);
}

#[test]
fn test_writing_to_an_output_file() {
    let (at, mut ucmd) = at_and_ucmd!();
    ucmd.args(&["-s", "pre", "-s", "post", "-S", "cat", "-o", "out.i", FIXTURE])
        .succeeds()
        .no_stdout();
    assert_eq!(at.read("out.i"), at.read(FIXTURE));
}

#[test]
fn test_several_pairs_run_concurrently() {
    let (at, mut ucmd) = at_and_ucmd!();
    at.write("a.txt", "#include <a.h>\nalpha\n");
    at.write("b.txt", "beta\ngamma\n");
    ucmd.args(&[
        "a.txt", "b.txt", "-s", "pre", "post", "-S", "cat", "-o", "a.out", "-o", "b.out",
    ])
    .succeeds()
    .no_stdout();
    assert_eq!(at.read("a.out"), "#include <a.h>\nalpha\n");
    assert_eq!(at.read("b.out"), "beta\ngamma\n");
}

#[test]
fn test_range_selection_is_strict() {
    let (at, mut ucmd) = at_and_ucmd!();
    at.write("nums.txt", "0\n1\n2\n3\n4\n");
    ucmd.args(&["-s", "pre", "-S", "cat", "-r", "4,1", "-o", "-", "nums.txt"])
        .succeeds()
        .stdout_only("2\n3\n");
}

#[test]
fn test_test_mode_discards_all_output() {
    new_ucmd!()
        .args(&[FIXTURE, "-t", "-s", "pre", "-S", "cat"])
        .succeeds()
        .no_stdout();
}

#[test]
fn test_more_than_one_stdin_is_rejected() {
    new_ucmd!()
        .args(&["-", "-", "-s", "pre", "-S", "cat"])
        .fails()
        .stderr_contains("Stdin ('-') can be processed only once.");
}

#[test]
fn test_malformed_range_is_rejected() {
    new_ucmd!()
        .args(&[FIXTURE, "-s", "pre", "-S", "cat", "-r", "oops"])
        .fails()
        .stderr_contains("Invalid range");
}

#[test]
fn test_version() {
    new_ucmd!()
        .arg("--version")
        .succeeds()
        .stdout_contains("ppguard");
    new_ucmd!().arg("-v").succeeds().stdout_contains("ppguard");
}

#[test]
fn test_help() {
    new_ucmd!().arg("--help").succeeds().stdout_contains("Usage");
}
