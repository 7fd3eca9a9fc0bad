pub mod auth_service;
pub mod checkin_service;
pub mod contact_service;
pub mod event_service;
pub mod gallery_service;
pub mod participant_feed;
pub mod participant_service;
pub mod profile_service;
pub mod registration_service;
pub mod storage_service;
pub mod team_members_service;
