//! Bayer and Flamsteed star designations

use crate::constellation::ConstellationAbbr;
use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Greek letters in Bayer order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum GreekLetter {
    Alpha,
    Beta,
    Gamma,
    Delta,
    Epsilon,
    Zeta,
    Eta,
    Theta,
    Iota,
    Kappa,
    Lambda,
    Mu,
    Nu,
    Xi,
    Omicron,
    Pi,
    Rho,
    Sigma,
    Tau,
    Upsilon,
    Phi,
    Chi,
    Psi,
    Omega,
}

impl GreekLetter {
    pub const ALL: [GreekLetter; 24] = [
        GreekLetter::Alpha,
        GreekLetter::Beta,
        GreekLetter::Gamma,
        GreekLetter::Delta,
        GreekLetter::Epsilon,
        GreekLetter::Zeta,
        GreekLetter::Eta,
        GreekLetter::Theta,
        GreekLetter::Iota,
        GreekLetter::Kappa,
        GreekLetter::Lambda,
        GreekLetter::Mu,
        GreekLetter::Nu,
        GreekLetter::Xi,
        GreekLetter::Omicron,
        GreekLetter::Pi,
        GreekLetter::Rho,
        GreekLetter::Sigma,
        GreekLetter::Tau,
        GreekLetter::Upsilon,
        GreekLetter::Phi,
        GreekLetter::Chi,
        GreekLetter::Psi,
        GreekLetter::Omega,
    ];

    /// Three-letter catalog abbreviation (HYG style)
    pub fn abbreviation(self) -> &'static str {
        match self {
            GreekLetter::Alpha => "Alp",
            GreekLetter::Beta => "Bet",
            GreekLetter::Gamma => "Gam",
            GreekLetter::Delta => "Del",
            GreekLetter::Epsilon => "Eps",
            GreekLetter::Zeta => "Zet",
            GreekLetter::Eta => "Eta",
            GreekLetter::Theta => "The",
            GreekLetter::Iota => "Iot",
            GreekLetter::Kappa => "Kap",
            GreekLetter::Lambda => "Lam",
            GreekLetter::Mu => "Mu",
            GreekLetter::Nu => "Nu",
            GreekLetter::Xi => "Xi",
            GreekLetter::Omicron => "Omi",
            GreekLetter::Pi => "Pi",
            GreekLetter::Rho => "Rho",
            GreekLetter::Sigma => "Sig",
            GreekLetter::Tau => "Tau",
            GreekLetter::Upsilon => "Ups",
            GreekLetter::Phi => "Phi",
            GreekLetter::Chi => "Chi",
            GreekLetter::Psi => "Psi",
            GreekLetter::Omega => "Ome",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            GreekLetter::Alpha => "alpha",
            GreekLetter::Beta => "beta",
            GreekLetter::Gamma => "gamma",
            GreekLetter::Delta => "delta",
            GreekLetter::Epsilon => "epsilon",
            GreekLetter::Zeta => "zeta",
            GreekLetter::Eta => "eta",
            GreekLetter::Theta => "theta",
            GreekLetter::Iota => "iota",
            GreekLetter::Kappa => "kappa",
            GreekLetter::Lambda => "lambda",
            GreekLetter::Mu => "mu",
            GreekLetter::Nu => "nu",
            GreekLetter::Xi => "xi",
            GreekLetter::Omicron => "omicron",
            GreekLetter::Pi => "pi",
            GreekLetter::Rho => "rho",
            GreekLetter::Sigma => "sigma",
            GreekLetter::Tau => "tau",
            GreekLetter::Upsilon => "upsilon",
            GreekLetter::Phi => "phi",
            GreekLetter::Chi => "chi",
            GreekLetter::Psi => "psi",
            GreekLetter::Omega => "omega",
        }
    }

    /// Lower-case Greek symbol
    pub fn symbol(self) -> char {
        const SYMBOLS: [char; 24] = [
            'α', 'β', 'γ', 'δ', 'ε', 'ζ', 'η', 'θ', 'ι', 'κ', 'λ', 'μ', 'ν', 'ξ', 'ο', 'π', 'ρ',
            'σ', 'τ', 'υ', 'φ', 'χ', 'ψ', 'ω',
        ];
        SYMBOLS[self as usize]
    }

    /// Parse a Greek-letter token with an optional companion ordinal
    ///
    /// Accepts `Alp`, `alpha`, `Alp-1`, `Alp1` and `Alp 2`.
    pub fn parse_with_companion(token: &str) -> Option<(GreekLetter, Option<u8>)> {
        let token = token.trim();
        let letters_end = token
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(token.len());
        let (letters, rest) = token.split_at(letters_end);
        if letters.is_empty() {
            return None;
        }

        let letter = GreekLetter::ALL.into_iter().find(|letter| {
            letter.abbreviation().eq_ignore_ascii_case(letters)
                || letter.name().eq_ignore_ascii_case(letters)
        })?;

        let rest = rest.trim_start_matches(|c: char| c == '-' || c == ' ');
        let companion = if rest.is_empty() {
            None
        } else {
            Some(rest.parse::<u8>().ok()?)
        };

        Some((letter, companion))
    }
}

impl fmt::Display for GreekLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Bayer and/or Flamsteed designation of a star
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum BayerFlamsteed {
    Bayer {
        letter: GreekLetter,
        companion: Option<u8>,
        constellation: ConstellationAbbr,
    },
    Flamsteed {
        number: u16,
        constellation: ConstellationAbbr,
    },
    BayerFlamsteed {
        number: u16,
        letter: GreekLetter,
        companion: Option<u8>,
        constellation: ConstellationAbbr,
    },
}

impl BayerFlamsteed {
    /// Build a designation from the raw catalog columns
    ///
    /// Requires an IAU constellation abbreviation plus a Greek letter, a Flamsteed number,
    /// or both. Unparseable Greek text is ignored rather than rejected.
    pub fn from_catalog(
        bayer: Option<&str>,
        flamsteed: Option<u16>,
        constellation: Option<&str>,
    ) -> Option<Self> {
        let constellation = ConstellationAbbr::parse(constellation?)?;
        if !constellation.is_iau() {
            return None;
        }

        let bayer = bayer.and_then(GreekLetter::parse_with_companion);
        match (bayer, flamsteed) {
            (Some((letter, companion)), Some(number)) => Some(BayerFlamsteed::BayerFlamsteed {
                number,
                letter,
                companion,
                constellation,
            }),
            (Some((letter, companion)), None) => Some(BayerFlamsteed::Bayer {
                letter,
                companion,
                constellation,
            }),
            (None, Some(number)) => Some(BayerFlamsteed::Flamsteed {
                number,
                constellation,
            }),
            (None, None) => None,
        }
    }

    pub fn constellation(&self) -> ConstellationAbbr {
        match self {
            BayerFlamsteed::Bayer { constellation, .. }
            | BayerFlamsteed::Flamsteed { constellation, .. }
            | BayerFlamsteed::BayerFlamsteed { constellation, .. } => *constellation,
        }
    }

    pub fn greek_letter(&self) -> Option<GreekLetter> {
        match self {
            BayerFlamsteed::Bayer { letter, .. } | BayerFlamsteed::BayerFlamsteed { letter, .. } => {
                Some(*letter)
            }
            BayerFlamsteed::Flamsteed { .. } => None,
        }
    }

    pub fn flamsteed_number(&self) -> Option<u16> {
        match self {
            BayerFlamsteed::Flamsteed { number, .. }
            | BayerFlamsteed::BayerFlamsteed { number, .. } => Some(*number),
            BayerFlamsteed::Bayer { .. } => None,
        }
    }
}

impl fmt::Display for BayerFlamsteed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn letter(f: &mut fmt::Formatter<'_>, letter: GreekLetter, companion: Option<u8>) -> fmt::Result {
            match companion {
                Some(n) => write!(f, "{letter}{n}"),
                None => write!(f, "{letter}"),
            }
        }

        match self {
            BayerFlamsteed::Bayer {
                letter: l,
                companion,
                constellation,
            } => {
                letter(f, *l, *companion)?;
                write!(f, " {constellation}")
            }
            BayerFlamsteed::Flamsteed {
                number,
                constellation,
            } => write!(f, "{number} {constellation}"),
            BayerFlamsteed::BayerFlamsteed {
                number,
                letter: l,
                companion,
                constellation,
            } => {
                write!(f, "{number} ")?;
                letter(f, *l, *companion)?;
                write!(f, " {constellation}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_greek_tokens() {
        assert_eq!(
            GreekLetter::parse_with_companion("Alp"),
            Some((GreekLetter::Alpha, None))
        );
        assert_eq!(
            GreekLetter::parse_with_companion("omega"),
            Some((GreekLetter::Omega, None))
        );
        assert_eq!(
            GreekLetter::parse_with_companion("Kap-1"),
            Some((GreekLetter::Kappa, Some(1)))
        );
        assert_eq!(
            GreekLetter::parse_with_companion("Alp2"),
            Some((GreekLetter::Alpha, Some(2)))
        );
        assert_eq!(
            GreekLetter::parse_with_companion("The 2"),
            Some((GreekLetter::Theta, Some(2)))
        );
        assert_eq!(GreekLetter::parse_with_companion("Foo"), None);
        assert_eq!(GreekLetter::parse_with_companion("Alp-x"), None);
        assert_eq!(GreekLetter::parse_with_companion(""), None);
    }

    #[test]
    fn test_symbols_follow_bayer_order() {
        assert_eq!(GreekLetter::Alpha.symbol(), 'α');
        assert_eq!(GreekLetter::Omicron.symbol(), 'ο');
        assert_eq!(GreekLetter::Omega.symbol(), 'ω');
    }

    #[test]
    fn test_from_catalog_variants() {
        let bayer = BayerFlamsteed::from_catalog(Some("Alp"), None, Some("CMa")).unwrap();
        assert!(matches!(bayer, BayerFlamsteed::Bayer { .. }));
        assert_eq!(bayer.to_string(), "α CMa");

        let flamsteed = BayerFlamsteed::from_catalog(None, Some(61), Some("cyg")).unwrap();
        assert_eq!(flamsteed.flamsteed_number(), Some(61));
        assert_eq!(flamsteed.to_string(), "61 Cyg");

        let both = BayerFlamsteed::from_catalog(Some("Bet-1"), Some(8), Some("Sco")).unwrap();
        assert_eq!(both.greek_letter(), Some(GreekLetter::Beta));
        assert_eq!(both.to_string(), "8 β1 Sco");
    }

    #[test]
    fn test_from_catalog_requires_constellation_and_token() {
        assert!(BayerFlamsteed::from_catalog(Some("Alp"), None, None).is_none());
        assert!(BayerFlamsteed::from_catalog(Some("Alp"), None, Some("Zzz")).is_none());
        assert!(BayerFlamsteed::from_catalog(None, None, Some("Ori")).is_none());
        assert!(BayerFlamsteed::from_catalog(Some("Foo"), None, Some("Ori")).is_none());
        // Serpens display regions are not IAU abbreviations
        assert!(BayerFlamsteed::from_catalog(Some("Alp"), None, Some("Ser1")).is_none());
        assert!(BayerFlamsteed::from_catalog(Some("Alp"), None, Some("Ser")).is_some());
    }

    #[test]
    fn test_unparseable_greek_falls_back_to_flamsteed() {
        let designation = BayerFlamsteed::from_catalog(Some("???"), Some(5), Some("Ori")).unwrap();
        assert!(matches!(designation, BayerFlamsteed::Flamsteed { number: 5, .. }));
    }
}
