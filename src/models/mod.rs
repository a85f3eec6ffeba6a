// Model exports
pub mod domain;
pub mod patch;
pub mod requests;
pub mod responses;

pub use domain::{
    BrokerId, Gender, Interest, InterestId, InterestStatus, MaritalStatus, NewInterest, NewProfile, Page,
    ParseEnumError, Principal, Profile, ProfileAttributes, ProfileId, Role,
};
pub use patch::{Patch, ProfilePatch};
pub use requests::{
    CreateProfileRequest, RespondInterestRequest, SearchProfilesRequest, SendInterestRequest, UpdateProfileRequest,
};
pub use responses::{ErrorResponse, HealthResponse, InterestView, ProfileSummary, ProfileView};
