pub mod analytics;
pub mod cancel;
pub mod cli;
pub mod commands;
pub mod config;
pub mod debounce;
pub mod display;
pub mod error;
pub mod scroll;
pub mod search;
pub mod source;
pub mod types;

pub use analytics::{LocationCount, group_by_location};
pub use cancel::{CancelReason, CancelToken, CancellationManager};
pub use config::Config;
pub use debounce::{Debounced, Debouncer};
pub use error::{ErrorKind, Result, RickdashError};
pub use scroll::{
    InfiniteScroll, LoadMoreFn, ManualObserver, ScrollMetrics, SentinelObserver, TriggerOptions,
};
pub use search::{SearchCoordinator, SearchMode, SearchOptions, SearchSnapshot};
pub use source::{
    AppendPages, CharacterFilter, GraphQlSource, MergePolicy, Page, PageInfo, PageRequest,
    PageSource,
};
pub use types::{Character, CharacterDetail, CharacterStatus, EpisodeRef, LocationRef};
