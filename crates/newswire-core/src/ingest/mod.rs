mod api;
mod feeds;
mod source;

pub use api::{GNewsSource, NewsApiSource};
pub use feeds::{BingNewsSource, GoogleNewsSource};
pub use source::{
    build_http_client, FetchOutcome, RawItem, Source, SourceInfo, SourceKind,
};
