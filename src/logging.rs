use std::path::Path;

pub const LOG_FILE_BASENAME: &str = "gunluk-dostum";
pub const LOG_FILE_SUFFIX: &str = "log";
pub const LOG_ROTATE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
pub const LOG_ROTATE_KEEP_FILES: usize = 7;
pub const LOG_ENV: &str = "GUNLUK_LOG";

/// Logs sit next to data.json and settings.json.
pub fn log_directory(app_data_dir: &Path) -> &Path {
    app_data_dir
}

/// First non-blank of `GUNLUK_LOG`, `RUST_LOG`, then the build default.
pub fn log_spec(app_env: Option<String>, rust_log: Option<String>, debug_build: bool) -> String {
    let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    non_blank(app_env)
        .or_else(|| non_blank(rust_log))
        .unwrap_or_else(|| {
            if debug_build {
                "warn,gunluk_dostum_lib=debug".to_string()
            } else {
                "warn,gunluk_dostum_lib=info".to_string()
            }
        })
}

#[cfg(all(feature = "app", not(test)))]
pub fn init_logging(app_data_dir: &Path) -> Result<(), flexi_logger::FlexiLoggerError> {
    use flexi_logger::{
        detailed_format, Cleanup, Criterion, Duplicate, FileSpec, Logger, Naming, WriteMode,
    };

    std::fs::create_dir_all(app_data_dir)?;

    let spec = log_spec(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
        cfg!(debug_assertions),
    );

    Logger::try_with_str(&spec)?
        .log_to_file(
            FileSpec::default()
                .directory(log_directory(app_data_dir))
                .basename(LOG_FILE_BASENAME)
                .suffix(LOG_FILE_SUFFIX),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .format_for_files(detailed_format)
        .rotate(
            Criterion::Size(LOG_ROTATE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(LOG_ROTATE_KEEP_FILES),
        )
        .duplicate_to_stdout(if cfg!(debug_assertions) {
            Duplicate::Info
        } else {
            Duplicate::None
        })
        .start()?;

    install_panic_hook();

    log::info!(
        "logger ready spec={spec} dir={}",
        log_directory(app_data_dir).display()
    );
    Ok(())
}

#[cfg(all(feature = "app", not(test)))]
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info: &std::panic::PanicHookInfo<'_>| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<non-string panic payload>");
        let location = info
            .location()
            .map(|loc| loc.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        log::error!(
            "panic: payload={payload} location={location}\nbacktrace:\n{}",
            std::backtrace::Backtrace::force_capture()
        );
        default_hook(info);
    }));
}
