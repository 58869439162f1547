use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {category} value: {value:?}")]
pub struct ParseCategoryError {
    pub category: &'static str,
    pub value: String,
}

/// Declares a closed set of posting attribute values stored as text.
macro_rules! category {
    ($(#[$meta:meta])* $name:ident: $label:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseCategoryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseCategoryError {
                        category: $label,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

category!(
    /// Total trip budget per person, in KRW.
    Budget: "budget" {
        Under100k => "under_100k",
        From100kTo300k => "100k_to_300k",
        From300kTo500k => "300k_to_500k",
        From500kTo1m => "500k_to_1m",
        Over1m => "over_1m",
    }
);

category!(
    Headcount: "headcount" {
        One => "one",
        Two => "two",
        ThreeToFour => "three_to_four",
        FiveOrMore => "five_or_more",
    }
);

category!(
    Location: "location" {
        Seoul => "seoul",
        Gyeonggi => "gyeonggi",
        Incheon => "incheon",
        Gangwon => "gangwon",
        Chungcheong => "chungcheong",
        Jeolla => "jeolla",
        Gyeongsang => "gyeongsang",
        Busan => "busan",
        Jeju => "jeju",
    }
);

category!(
    Period: "period" {
        DayTrip => "day_trip",
        OneNight => "one_night",
        TwoNights => "two_nights",
        ThreeNightsOrMore => "three_nights_or_more",
    }
);

category!(
    Season: "season" {
        Spring => "spring",
        Summer => "summer",
        Autumn => "autumn",
        Winter => "winter",
    }
);

category!(
    Vehicle: "vehicle" {
        Car => "car",
        PublicTransport => "public_transport",
        Bicycle => "bicycle",
        Walking => "walking",
    }
);

category!(
    /// Set-valued: a posting may carry several themes.
    Theme: "theme" {
        Healing => "healing",
        Food => "food",
        Activity => "activity",
        Culture => "culture",
        Nature => "nature",
        Photo => "photo",
        Shopping => "shopping",
    }
);

category!(
    /// Set-valued: who the trip is meant to be taken with.
    WithWho: "with_who" {
        Alone => "alone",
        Friends => "friends",
        Partner => "partner",
        Family => "family",
        Pet => "pet",
    }
);

/// Parses a stored text array back into category values.
pub fn parse_set<T>(values: &[String]) -> Result<Vec<T>, ParseCategoryError>
where
    T: FromStr<Err = ParseCategoryError>,
{
    values.iter().map(|v| v.parse()).collect()
}
