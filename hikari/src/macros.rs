#[macro_export]
macro_rules! expect {
    ($result:expr, $msg:expr) => {
        match $result {
            Ok(t) => t,
            Err(why) => {
                panic!("{}: {:?}", $msg, why);
            }
        }
    };
}

// Log macros that tag the message with the calling module so per-ray traces
// from different kernel stages are easy to tell apart

#[macro_export]
macro_rules! hikari_trace {
    ($($arg:tt)+) => {
        log::trace!("{}: {}", module_path!(), format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! hikari_debug {
    ($($arg:tt)+) => {
        log::debug!("{}: {}", module_path!(), format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! hikari_info {
    ($($arg:tt)+) => {
        log::info!("{}: {}", module_path!(), format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! hikari_warn {
    ($($arg:tt)+) => {
        log::warn!("{}: {}", module_path!(), format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! hikari_error {
    ($($arg:tt)+) => {
        log::error!("{}: {}", module_path!(), format_args!($($arg)+))
    };
}
