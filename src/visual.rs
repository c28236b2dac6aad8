use crate::error::{DizzyError, Result};
use std::fmt;
use std::io::Write;

/// X11 visual class
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorClass {
    StaticGray,
    GrayScale,
    StaticColor,
    PseudoColor,
    TrueColor,
    DirectColor,
    /// A class code outside the core protocol
    Unknown(u8),
}

impl ColorClass {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => ColorClass::StaticGray,
            1 => ColorClass::GrayScale,
            2 => ColorClass::StaticColor,
            3 => ColorClass::PseudoColor,
            4 => ColorClass::TrueColor,
            5 => ColorClass::DirectColor,
            other => ColorClass::Unknown(other),
        }
    }
}

impl fmt::Display for ColorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorClass::StaticGray => "StaticGray",
            ColorClass::GrayScale => "GrayScale",
            ColorClass::StaticColor => "StaticColor",
            ColorClass::PseudoColor => "PseudoColor",
            ColorClass::TrueColor => "TrueColor",
            ColorClass::DirectColor => "DirectColor",
            ColorClass::Unknown(raw) => return write!(f, "unknown_visual_class_{raw:x}"),
        };
        f.write_str(name)
    }
}

/// The visual a window gets created with
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceConfig {
    pub visual_id: u32,
    pub class: ColorClass,
    pub depth: u8,
}

/// A visual the double buffer extension reports for the screen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub visual_id: u32,
    pub depth: u8,
}

/// What the user asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisualRequest {
    pub class: ColorClass,
    /// 0 picks the deepest visual of the class
    pub depth: u8,
    /// Overrides class and depth when set
    pub visual_id: Option<u32>,
}

impl Default for VisualRequest {
    fn default() -> Self {
        VisualRequest {
            class: ColorClass::PseudoColor,
            depth: 0,
            visual_id: None,
        }
    }
}

/// Where the candidates and their descriptors come from
pub trait VisualSource {
    /// Double buffer capable visuals of the screen, in server order
    fn double_buffer_visuals(&self) -> Result<Vec<Candidate>>;

    fn describe(&self, visual_id: u32) -> Option<SurfaceConfig>;
}

/// Chooses a visual for `request`, listing every candidate to `listing` if given.
///
/// Without an explicit id and with depth 0 the first of the deepest visuals of
/// the class wins; with a depth the last exact match wins.
pub fn choose_visual<V: VisualSource + ?Sized>(
    source: &V,
    request: &VisualRequest,
    mut listing: Option<&mut dyn Write>,
) -> Result<SurfaceConfig> {
    let candidates = source.double_buffer_visuals()?;

    if let Some(out) = listing.as_deref_mut() {
        writeln!(out, "\nThe double buffer capable visuals are:")?;
        writeln!(out, "      visual ID    depth    class")?;
    }

    let mut chosen: Option<SurfaceConfig> = None;
    let mut chosen_depth = 0;
    for candidate in &candidates {
        let config = source
            .describe(candidate.visual_id)
            .ok_or(DizzyError::ConfigResolution(candidate.visual_id))?;

        if let Some(out) = listing.as_deref_mut() {
            writeln!(
                out,
                "        {:#4x}      {:>4}    {}",
                candidate.visual_id, candidate.depth, config.class
            )?;
        }

        let pick = match request.visual_id {
            Some(id) => config.visual_id == id,
            None if config.class != request.class => false,
            None if request.depth == 0 => candidate.depth > chosen_depth,
            None => candidate.depth == request.depth,
        };
        if pick {
            chosen = Some(config);
            chosen_depth = candidate.depth;
        }
    }

    let chosen = chosen.ok_or(DizzyError::NoMatchingConfig)?;
    if let Some(out) = listing {
        writeln!(out)?;
    }
    Ok(chosen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Candidates paired with the class their descriptor resolves to
    struct FixedVisuals(Vec<(Candidate, ColorClass)>);

    impl FixedVisuals {
        fn of(entries: &[(u32, u8, ColorClass)]) -> Self {
            FixedVisuals(
                entries
                    .iter()
                    .map(|&(visual_id, depth, class)| (Candidate { visual_id, depth }, class))
                    .collect(),
            )
        }
    }

    impl VisualSource for FixedVisuals {
        fn double_buffer_visuals(&self) -> Result<Vec<Candidate>> {
            Ok(self.0.iter().map(|(c, _)| *c).collect())
        }

        fn describe(&self, visual_id: u32) -> Option<SurfaceConfig> {
            self.0
                .iter()
                .find(|(c, _)| c.visual_id == visual_id)
                .map(|(c, class)| SurfaceConfig {
                    visual_id,
                    class: *class,
                    depth: c.depth,
                })
        }
    }

    struct NoExtension;

    impl VisualSource for NoExtension {
        fn double_buffer_visuals(&self) -> Result<Vec<Candidate>> {
            Err(DizzyError::ExtensionUnavailable("DBE".into()))
        }

        fn describe(&self, _: u32) -> Option<SurfaceConfig> {
            None
        }
    }

    use ColorClass::*;

    fn request(class: ColorClass, depth: u8) -> VisualRequest {
        VisualRequest { class, depth, visual_id: None }
    }

    #[test]
    fn deepest_of_class_first_occurrence_wins() {
        let visuals = FixedVisuals::of(&[
            (0x21, 8, PseudoColor),
            (0x22, 24, TrueColor),
            (0x23, 24, TrueColor),
            (0x24, 16, TrueColor),
        ]);
        let chosen = choose_visual(&visuals, &request(TrueColor, 0), None).unwrap();
        assert_eq!(chosen.visual_id, 0x22);
        assert_eq!(chosen.depth, 24);
    }

    #[test]
    fn exact_depth_last_occurrence_wins() {
        let visuals = FixedVisuals::of(&[
            (0x21, 24, TrueColor),
            (0x22, 32, TrueColor),
            (0x23, 24, TrueColor),
            (0x24, 24, DirectColor),
        ]);
        let chosen = choose_visual(&visuals, &request(TrueColor, 24), None).unwrap();
        assert_eq!(chosen.visual_id, 0x23);
    }

    #[test]
    fn explicit_id_ignores_class_and_depth() {
        let visuals = FixedVisuals::of(&[(0x21, 8, PseudoColor), (0x22, 24, TrueColor)]);
        let req = VisualRequest {
            class: StaticGray,
            depth: 1,
            visual_id: Some(0x22),
        };
        assert_eq!(choose_visual(&visuals, &req, None).unwrap().visual_id, 0x22);
    }

    #[test]
    fn missing_explicit_id_fails() {
        let visuals = FixedVisuals::of(&[(0x22, 24, TrueColor), (0x23, 8, PseudoColor)]);
        let req = VisualRequest {
            visual_id: Some(0x21),
            ..VisualRequest::default()
        };
        assert!(matches!(
            choose_visual(&visuals, &req, None),
            Err(DizzyError::NoMatchingConfig)
        ));
    }

    #[test]
    fn no_visual_of_the_class_fails() {
        let visuals = FixedVisuals::of(&[(0x22, 24, TrueColor)]);
        assert!(matches!(
            choose_visual(&visuals, &VisualRequest::default(), None),
            Err(DizzyError::NoMatchingConfig)
        ));
    }

    #[test]
    fn unresolvable_candidate_is_an_error() {
        struct Dangling;
        impl VisualSource for Dangling {
            fn double_buffer_visuals(&self) -> Result<Vec<Candidate>> {
                Ok(vec![Candidate { visual_id: 0x40, depth: 24 }])
            }
            fn describe(&self, _: u32) -> Option<SurfaceConfig> {
                None
            }
        }
        assert!(matches!(
            choose_visual(&Dangling, &VisualRequest::default(), None),
            Err(DizzyError::ConfigResolution(0x40))
        ));
    }

    #[test]
    fn missing_extension_propagates() {
        assert!(matches!(
            choose_visual(&NoExtension, &VisualRequest::default(), None),
            Err(DizzyError::ExtensionUnavailable(_))
        ));
    }

    #[test]
    fn listing_prints_every_candidate() {
        let visuals = FixedVisuals::of(&[(0x21, 8, PseudoColor), (0x2a, 24, Unknown(9))]);
        let mut out = Vec::new();
        choose_visual(&visuals, &VisualRequest::default(), Some(&mut out as &mut dyn Write)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "\nThe double buffer capable visuals are:\n\
             \x20     visual ID    depth    class\n\
             \x20       0x21         8    PseudoColor\n\
             \x20       0x2a        24    unknown_visual_class_9\n\n"
        );
    }

    #[test]
    fn class_names_round_trip_raw_codes() {
        assert_eq!(ColorClass::from_raw(4), TrueColor);
        assert_eq!(ColorClass::from_raw(0), StaticGray);
        assert_eq!(ColorClass::from_raw(0x1f).to_string(), "unknown_visual_class_1f");
    }

    fn known_class() -> impl Strategy<Value = ColorClass> {
        (0u8..6).prop_map(ColorClass::from_raw)
    }

    fn visual_list() -> impl Strategy<Value = Vec<(u32, u8, ColorClass)>> {
        prop::collection::vec((prop::sample::select(vec![1u8, 8, 16, 24, 32]), known_class()), 0..12)
            .prop_map(|entries| {
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, (depth, class))| (0x20 + i as u32, depth, class))
                    .collect()
            })
    }

    proptest! {
        #[test]
        fn depth_search_picks_earliest_deepest(entries in visual_list(), class in known_class()) {
            let visuals = FixedVisuals::of(&entries);
            let expected = entries
                .iter()
                .filter(|e| e.2 == class)
                .fold(None::<&(u32, u8, ColorClass)>, |best, e| match best {
                    Some(b) if b.1 >= e.1 => Some(b),
                    _ => Some(e),
                })
                .map(|e| e.0);
            let got = choose_visual(&visuals, &request(class, 0), None).ok().map(|c| c.visual_id);
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn exact_depth_picks_last_match(entries in visual_list(), class in known_class(), depth in prop::sample::select(vec![1u8, 8, 16, 24, 32])) {
            let visuals = FixedVisuals::of(&entries);
            let expected = entries
                .iter()
                .rev()
                .find(|e| e.2 == class && e.1 == depth)
                .map(|e| e.0);
            let got = choose_visual(&visuals, &request(class, depth), None).ok().map(|c| c.visual_id);
            prop_assert_eq!(got, expected);
        }

        #[test]
        fn explicit_id_found_iff_listed(entries in visual_list(), id in 0x1eu32..0x30) {
            let visuals = FixedVisuals::of(&entries);
            let req = VisualRequest { visual_id: Some(id), ..VisualRequest::default() };
            let got = choose_visual(&visuals, &req, None).ok().map(|c| c.visual_id);
            let listed = entries.iter().any(|e| e.0 == id);
            prop_assert_eq!(got, listed.then_some(id));
        }
    }
}
