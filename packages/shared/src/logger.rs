//! Logging setup utilities for the Chunkchat binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library crates whose log output follows the binary's default level.
const WORKSPACE_CRATES: [&str; 3] = ["chunkchat_shared", "chunkchat_server", "chunkchat_client"];

/// Initialize the tracing subscriber with the specified default log level.
///
/// This function sets up logging for every workspace crate and the binary.
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "chunkchat-server")
/// * `default_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use chunkchat_shared::logger::setup_logger;
///
/// setup_logger("chunkchat-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut targets: Vec<&str> = WORKSPACE_CRATES.to_vec();
    if !targets.contains(&binary_target.as_str()) {
        targets.push(&binary_target);
    }
    targets
        .iter()
        .map(|target| format!("{}={}", target, default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace_crates_once() {
        // テスト項目: ワークスペースのクレート名と同じバイナリは重複して設定されない
        // given (前提条件):
        let binary_name = "chunkchat-server";

        // when (操作):
        let directives = default_directives(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(
            directives,
            "chunkchat_shared=debug,chunkchat_server=debug,chunkchat_client=debug"
        );
    }

    #[test]
    fn test_default_directives_add_other_binary() {
        // テスト項目: ワークスペース外の名前のバイナリは末尾に追加される
        // given (前提条件):
        let binary_name = "chat-bench";

        // when (操作):
        let directives = default_directives(binary_name, "warn");

        // then (期待する結果):
        assert_eq!(
            directives,
            "chunkchat_shared=warn,chunkchat_server=warn,chunkchat_client=warn,chat_bench=warn"
        );
    }
}
