/// Creates an anyhow error prefixed with the current file name and line number
#[macro_export]
macro_rules! file_error {
    ($($arg:tt)*) => {
        ::anyhow::anyhow!(
            "[{}:{}] {}",
            std::path::Path::new(file!())
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            line!(),
            format!($($arg)*)
        )
    };
}
