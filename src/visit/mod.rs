mod membership;
mod names;

pub use membership::{Membership, MembershipIndex, Party, VisitedSets, Visitors};
pub use names::{display_name, normalize, RegionKey, NAME_PROPERTIES};
