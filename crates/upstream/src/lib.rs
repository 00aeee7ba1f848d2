//! # Upstream
//!
//! Concrete configuration sources.
//!
//! Responsibilities:
//! - Implement [`contracts::UpdateSource`] for sources that do not need the
//!   real delivery transport
//! - Turn whatever they watch into [`contracts::UpdateBatch`] messages
//!
//! ## In-memory source
//!
//! ```ignore
//! use upstream::ChannelSource;
//!
//! let (source, publisher) = ChannelSource::new("rc");
//! // hand `source` to the provider, then:
//! publisher.publish(batch).await?;
//! ```
//!
//! ## Directory source
//!
//! ```ignore
//! use upstream::{DirectorySource, DirectorySourceConfig};
//!
//! let source = DirectorySource::new(DirectorySourceConfig::new("./patches"))?;
//! ```

mod channel_source;
mod directory_source;
mod error;

pub use channel_source::{ChannelSource, UpdatePublisher};
pub use directory_source::{DirectorySource, DirectorySourceConfig};
pub use error::{Result, UpstreamError};
