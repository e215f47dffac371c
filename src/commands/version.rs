//! Version command

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Print the tool version, before any context or config is loaded.
pub fn run(json: bool) {
    if json {
        println!("{}", serde_json::json!({ "version": VERSION }));
    } else {
        println!("rollout {VERSION}");
    }
}
