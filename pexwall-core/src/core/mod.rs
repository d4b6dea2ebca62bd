// export all modules
pub mod cache;
pub mod categories;
pub mod clock;
pub mod context;
pub mod error;
pub mod exports;
pub mod gateway;
pub mod request;
pub mod storage;
pub mod wallpaper;

#[cfg(test)]
pub(crate) mod testing;
