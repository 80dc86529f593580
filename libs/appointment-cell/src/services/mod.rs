pub mod availability;
pub mod booking;
pub mod cancellation;
pub mod confirmation;
pub mod conflict;
pub mod follow_up;
pub mod lifecycle;
pub mod locks;
pub mod reschedule;

pub use availability::SlotAvailabilityService;
pub use booking::AppointmentBookingService;
pub use cancellation::{
    AppointmentCancellationService, CancellationFeeStrategy, WaivedCancellationFees,
};
pub use confirmation::AppointmentConfirmationService;
pub use conflict::ConflictDetectionService;
pub use follow_up::FollowUpSchedulingService;
pub use lifecycle::SessionLifecycleService;
pub use locks::ProfessionalScheduleLocks;
pub use reschedule::AppointmentRescheduleService;
