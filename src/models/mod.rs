pub mod contact_messages;
pub mod events;
pub mod gallery;
pub mod profiles;
pub mod registrations;
pub mod team_members;
pub mod teams;

pub use contact_messages::ContactMessageRow;
pub use events::{EventDetails, EventRow, EventStatus};
pub use gallery::{GalleryCollectionRow, GalleryImageRow, GallerySectionRow};
pub use profiles::{CheckInDay, ProfileRow};
pub use registrations::{ParticipantRow, RegistrationRole, RegistrationRow, UserRegistrationRow};
pub use team_members::TeamMemberRow;
pub use teams::{TeamMemberEntryRow, TeamRow};
