pub mod create_event;
pub use create_event::{CreateEventArgs, CreateEventTool, MeetingRequest, MissingFields};
