//! End-to-end tests against real interpreters and compilers.
//!
//! These tests are ignored by default because they need the toolchains on
//! `PATH` (python3, node, gcc, g++, objdump, rustc, go, javac, ...).
//!
//! Run with:
//!
//! ```bash
//! cargo test -p goforit-engine --test toolchains -- --ignored
//! ```

use std::time::{Duration, Instant};

use goforit_engine::{Language, evaluate};

#[tokio::test]
#[ignore = "requires python3"]
async fn python_hello_world() {
    let result = evaluate(Language::Python, "print(\"Hello, World!\")").await;
    assert_eq!(result.stdout, "Hello, World!\n");
    assert_eq!(result.stderr, "");
    assert_eq!(result.exit_code, 0);
    assert!(result.artifacts.is_empty());
}

#[tokio::test]
#[ignore = "requires python3"]
async fn python_syntax_error() {
    let result = evaluate(Language::Python, "print(\"unterminated").await;
    assert_ne!(result.exit_code, 0);
    assert!(result.stderr.contains("SyntaxError"));
}

#[tokio::test]
#[ignore = "requires node"]
async fn javascript_infinite_loop_times_out() {
    let started = Instant::now();
    let result = evaluate(Language::Javascript, "while(true){}").await;
    assert_eq!(result.exit_code, 124);
    assert_eq!(result.stderr, "Execution timed out");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
#[ignore = "requires gcc"]
async fn c_hello_world() {
    let source = "#include <stdio.h>\nint main(void) { printf(\"Hello, World!\\n\"); return 0; }\n";
    let result = evaluate(Language::C, source).await;
    assert_eq!(result.stdout, "Hello, World!\n");
    assert_eq!(result.exit_code, 0);
}

#[tokio::test]
#[ignore = "requires gcc"]
async fn c_missing_include_is_a_build_failure() {
    let source = "int main(void) { printf(\"hi\\n\"); return 0 }\n";
    let result = evaluate(Language::C, source).await;
    assert_ne!(result.exit_code, 0);
    assert_eq!(result.stdout, "");
    assert!(result.stderr.contains("error"));
}

#[tokio::test]
#[ignore = "requires gcc and objdump"]
async fn c_to_objdump_artifacts_have_no_scratch_paths() {
    let source = "// -O1\nint main(void) { return 0; }\n";
    let result = evaluate(Language::CToObjdump, source).await;
    assert_eq!(result.exit_code, 0, "{}", result.stderr);
    assert_eq!(result.artifacts.len(), 2);
    assert!(result.labels()[0].starts_with("asm-"));
    assert_eq!(result.labels()[1], "hexdump");
    for artifact in &result.artifacts {
        assert!(!artifact.content.contains("goforit-"));
    }
}

#[tokio::test]
#[ignore = "requires gcc"]
async fn c_to_asm_listing_has_header() {
    let result = evaluate(Language::CToAsm, "int main(void) { return 0; }\n").await;
    assert_eq!(result.exit_code, 0, "{}", result.stderr);
    assert!(result.artifacts[0].content.starts_with("// arch: "));
}

#[tokio::test]
#[ignore = "requires rustc"]
async fn rust_hello_world() {
    let result = evaluate(Language::Rust, "fn main() { println!(\"Hello, World!\"); }").await;
    assert_eq!(result.stdout, "Hello, World!\n");
    assert_eq!(result.exit_code, 0);
}

#[tokio::test]
#[ignore = "requires go and objdump"]
async fn go_without_package_clause() {
    let source = "import \"fmt\"\n\nfunc main() { fmt.Println(\"Hello, World!\") }\n";
    let result = evaluate(Language::Go, source).await;
    assert_eq!(result.stdout, "Hello, World!\n", "{}", result.stderr);
    assert_eq!(result.labels().last().copied(), Some("hexdump"));
}

#[tokio::test]
#[ignore = "requires a JDK"]
async fn java_hello_world() {
    let source = "public class Main {\n  public static void main(String[] args) {\n    System.out.println(\"Hello, World!\");\n  }\n}\n";
    let result = evaluate(Language::Java, source).await;
    assert_eq!(result.stdout, "Hello, World!\n", "{}", result.stderr);
    assert_eq!(result.labels(), ["java-bytecode", "hexdump"]);
}

#[tokio::test]
async fn brainfuck_needs_no_toolchain() {
    let source = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.>>.<-.<.+++.------.--------.>>+.>++.";
    let result = evaluate(Language::Brainfuck, source).await;
    assert_eq!(result.stdout, "Hello World!\n");
    assert_eq!(result.exit_code, 0);
}
