#[macro_export]
macro_rules! env_lazy {
    ($( $vis:vis $name:ident : $ty:ty = ($key:literal, $default:expr); )* ) => {
        $(
            $vis static $name: ::std::sync::LazyLock<$ty> = ::std::sync::LazyLock::new(|| {
                $crate::libs::config::load_env();
                $crate::libs::config::Config::get_var_t::<$ty>($key, $default)
            });
        )*
    };
}

env_lazy! {
    pub RECEIPT_TIMEOUT_SECS: u64       = ("RECEIPT_TIMEOUT_SECS", 180);
    pub FINAL_RECEIPT_TIMEOUT_SECS: u64 = ("FINAL_RECEIPT_TIMEOUT_SECS", 120);
    pub RECEIPT_POLL_MS: u64            = ("RECEIPT_POLL_MS", 1000);
    pub HISTORY_DEPTH: u64              = ("HISTORY_DEPTH", 50);
}

pub const NATIVE_SYMBOL: &str = "CELO";
pub const STABLE_SYMBOL: &str = "cUSD";
