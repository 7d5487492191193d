use async_trait::async_trait;

use crate::MachinaResult;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A box stored in the box collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxInfo {
    /// The box name, e.g. `ubuntu/jammy64`
    pub name: String,

    /// The provider the box is built for
    pub provider: String,

    /// The box version
    pub version: String,
}

/// Where a box is added from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxSource {
    /// Look the box up by name in the box catalog and download the matching version.
    Catalog,

    /// Download the box from this URL.
    Url(String),
}

/// A request to add a box to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxAddRequest {
    /// The box name
    pub name: String,

    /// The provider the box must support
    pub provider: String,

    /// An optional version constraint
    pub version: Option<String>,

    /// Where to get it from
    pub source: BoxSource,
}

/// The local store of boxes.
#[async_trait]
pub trait BoxCollection: Send + Sync {
    /// Finds a box matching name, provider and an optional version constraint.
    async fn find(
        &self,
        name: &str,
        provider: &str,
        version: Option<&str>,
    ) -> MachinaResult<Option<BoxInfo>>;

    /// Adds a box.
    ///
    /// Returns [`MachinaError::BoxAlreadyExists`](crate::MachinaError::BoxAlreadyExists) if an
    /// identical box was added in the meantime.
    async fn add(&self, request: BoxAddRequest) -> MachinaResult<BoxInfo>;

    /// Removes a box.
    async fn destroy(&self, name: &str, provider: &str, version: &str) -> MachinaResult<()>;
}
