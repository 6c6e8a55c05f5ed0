use std::collections::{HashMap, HashSet};

use crate::map::Region;
use crate::visit::names::{normalize, RegionKey};

/// One of the parties whose visits are compared
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Party {
    Me,
    FriendOne,
    FriendTwo,
}

impl Party {
    pub const ALL: [Party; 3] = [Party::Me, Party::FriendOne, Party::FriendTwo];

    #[inline(always)]
    const fn bit(self) -> u8 {
        match self {
            Party::Me => 0b001,
            Party::FriendOne => 0b010,
            Party::FriendTwo => 0b100,
        }
    }
}

/// Which parties visited a region, bit0 = me, bit1 = friend one, bit2 = friend two
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Membership(u8);

impl Membership {
    pub const NONE: Membership = Membership(0);

    /// Build from a raw code, ignoring bits above the third party
    pub const fn from_code(code: u8) -> Self {
        Membership(code & 0b111)
    }

    #[inline(always)]
    pub const fn code(self) -> u8 {
        self.0
    }

    pub fn with(self, party: Party) -> Self {
        Membership(self.0 | party.bit())
    }

    pub fn contains(self, party: Party) -> bool {
        self.0 & party.bit() != 0
    }

    pub fn visitors(self) -> Visitors {
        match self.0 {
            0 => Visitors::Nobody,
            1 => Visitors::MeOnly,
            2 => Visitors::FriendOneOnly,
            4 => Visitors::FriendTwoOnly,
            3 => Visitors::MeAndFriendOne,
            5 => Visitors::MeAndFriendTwo,
            6 => Visitors::BothFriends,
            _ => Visitors::Everyone,
        }
    }
}

impl From<Visitors> for Membership {
    fn from(visitors: Visitors) -> Self {
        let code = match visitors {
            Visitors::Nobody => 0,
            Visitors::MeOnly => 1,
            Visitors::FriendOneOnly => 2,
            Visitors::MeAndFriendOne => 3,
            Visitors::FriendTwoOnly => 4,
            Visitors::MeAndFriendTwo => 5,
            Visitors::BothFriends => 6,
            Visitors::Everyone => 7,
        };
        Membership(code)
    }
}

/// Named view of a membership code
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Visitors {
    Nobody,
    MeOnly,
    FriendOneOnly,
    FriendTwoOnly,
    MeAndFriendOne,
    MeAndFriendTwo,
    BothFriends,
    Everyone,
}

/// Raw visited-name lists, one per party. Friend lists are optional.
#[derive(Clone, Debug, Default)]
pub struct VisitedSets {
    pub me: Vec<String>,
    pub friend_one: Option<Vec<String>>,
    pub friend_two: Option<Vec<String>>,
}

impl VisitedSets {
    pub fn new(me: Vec<String>) -> Self {
        Self {
            me,
            friend_one: None,
            friend_two: None,
        }
    }

    pub fn with_friend_one(mut self, names: Vec<String>) -> Self {
        self.friend_one = Some(names);
        self
    }

    pub fn with_friend_two(mut self, names: Vec<String>) -> Self {
        self.friend_two = Some(names);
        self
    }

    fn names(&self, party: Party) -> &[String] {
        match party {
            Party::Me => &self.me,
            Party::FriendOne => self.friend_one.as_deref().unwrap_or_default(),
            Party::FriendTwo => self.friend_two.as_deref().unwrap_or_default(),
        }
    }

    /// Whether a second friend is being compared (enables the three-way codes)
    pub fn has_friend_two(&self) -> bool {
        self.friend_two.is_some()
    }
}

/// Normalized key sets per party, built once per visited-set change
struct KeySets([HashSet<RegionKey>; 3]);

impl KeySets {
    fn build(sets: &VisitedSets) -> Self {
        KeySets(Party::ALL.map(|party| sets.names(party).iter().map(|n| normalize(n)).collect()))
    }

    #[inline(always)]
    fn membership(&self, key: &RegionKey) -> Membership {
        Party::ALL
            .iter()
            .zip(&self.0)
            .filter(|(_, keys)| keys.contains(key))
            .fold(Membership::NONE, |acc, (party, _)| acc.with(*party))
    }
}

/// Per-region membership codes for one render cycle
#[derive(Clone, Debug, Default)]
pub struct MembershipIndex {
    codes: HashMap<RegionKey, Membership>,
}

impl MembershipIndex {
    /// Resolve every region against the visited sets.
    /// Linear in regions plus visited names: each name is normalized once.
    pub fn resolve(regions: &[Region], sets: &VisitedSets) -> Self {
        let keys = KeySets::build(sets);
        let codes = regions
            .iter()
            .map(|region| (region.key.clone(), keys.membership(&region.key)))
            .collect();
        Self { codes }
    }

    /// Membership of a region, `NONE` for unknown keys
    pub fn get(&self, key: &RegionKey) -> Membership {
        self.codes.get(key).copied().unwrap_or_default()
    }

    /// Resolve a free-form name through the normalizer
    pub fn lookup(&self, name: &str) -> Membership {
        self.get(&normalize(name))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Count of regions each party has visited
    pub fn visited_count(&self, party: Party) -> usize {
        self.codes.values().filter(|m| m.contains(party)).count()
    }
}
