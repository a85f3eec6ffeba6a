// Business core exports
pub mod age;
pub mod directory;
pub mod error;
pub mod guard;
pub mod interests;
pub mod search;

pub use age::age_on;
pub use directory::{validate_attributes, ProfileDirectory};
pub use error::{ServiceError, ServiceResult};
pub use guard::{authorize, authorize_profile, Access, Guarded};
pub use interests::InterestWorkflow;
pub use search::{
    build_search_spec, Field, FilterValue, PageRequest, Predicate, SearchCriteria, SearchLimits, SearchSpec,
    SearchSpecBuilder, SortDirection, SortKey,
};
