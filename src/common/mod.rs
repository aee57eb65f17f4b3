use std::sync::LazyLock;
use std::thread::available_parallelism;

use tokio::runtime::{Builder, Runtime};

pub const ITEMS_TABLE: &str = "items";

pub const ITEM_SELECT_COLUMNS: &str = "id,original_path,cutout_path,cover_path";

pub const DEFAULT_BUCKET: &str = "wardrobe";

pub const DEFAULT_SOURCE_CONTENT_TYPE: &str = "image/jpeg";

pub const CUTOUT_SUFFIX: &str = "-cutout.png";

pub const MULTIPART_FILE_FIELD: &str = "file";

pub const CORS_ALLOW_ORIGIN: &str = "*";

pub const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

pub const CORS_ALLOW_METHODS: &str = "POST, OPTIONS";

pub static CURRENT_NUM_THREADS: LazyLock<usize> =
    LazyLock::new(|| available_parallelism().map(|n| n.get()).unwrap_or(4));

// Rocket-specific Tokio Runtime
// Every request, including the outbound storage and transform calls it awaits, runs here.
pub static ROCKET_RUNTIME: LazyLock<Runtime> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .worker_threads(*CURRENT_NUM_THREADS)
        .thread_name("rocket-io-worker")
        .enable_all()
        .build()
        .expect("Failed to build Rocket Tokio runtime")
});
