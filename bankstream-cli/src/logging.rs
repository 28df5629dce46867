use tracing_subscriber::{EnvFilter, fmt};

const CRATES: [&str; 4] = [
    "bankstream_core",
    "bankstream_ingest",
    "bankstream_sheets",
    "bankstream",
];

/// Our crates at `level`, everything else (hyper, rustls, ...) at warn.
pub fn filter_directive(level: &str) -> String {
    let mut directive = String::from("warn");
    for krate in CRATES {
        directive.push_str(&format!(",{krate}={level}"));
    }
    directive
}

/// `RUST_LOG` wins; otherwise `level`. Logs go to stderr.
pub fn init(level: &str) {
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        let d = filter_directive("debug");
        assert!(d.starts_with("warn,"));
        assert!(d.contains("bankstream_core=debug"));
        assert!(d.contains("bankstream=debug"));
        assert!(EnvFilter::try_new(&d).is_ok());
    }
}
