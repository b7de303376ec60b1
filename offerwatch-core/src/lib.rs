pub mod config;
pub mod detector;
pub mod error;
pub mod feed;
pub mod filters;
pub mod manager;
pub mod notifier;
pub mod store;
pub mod telegram;
pub mod watch;

pub use config::AppConfig;
pub use detector::{diff, ChangeDetector, SeenMap};
pub use error::{ConfigError, FetchError, NotifyError, WatchError};
pub use feed::{parse_offers, query_params, Entry, FeedClient, OfferSource};
pub use filters::FilterSet;
pub use manager::{filters_set_message, SetOutcome, WatchManager};
pub use notifier::{MessageSink, Notifier};
pub use store::FilterStore;
pub use telegram::{TelegramClient, TelegramSink, Update};
pub use watch::{
    offer_message, spawn_watch, CycleOutcome, WatchConfig, WatchHandle, WatchLoop,
    NO_OFFERS_MESSAGE,
};
