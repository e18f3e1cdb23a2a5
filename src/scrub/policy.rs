//! The allowlist policy table
//!
//! What may survive scrubbing: the set of permitted element names, the
//! per-element set of permitted attribute keys (namespace-qualified),
//! the elements allowed to carry free-form `data-*` attributes, and the
//! validation pattern for those names.
//!
//! The built-in SVG table is a fixed, versioned data asset. Changes to
//! it are security-relevant and get the same scrutiny as code changes.

use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

/// Valid custom data attribute names: `data-` followed by an
/// identifier that starts with a lowercase ASCII letter or underscore
/// and continues with word characters, dots, hyphens, or the Latin
/// letter ranges below. Names reserved with `data-xml` are handled by a
/// separate prefix check, since this engine has no lookahead.
const DATA_ATTR_PATTERN: &str =
    "^data-[a-z_][0-9A-Za-z_.\u{00E0}-\u{00F6}\u{00F8}-\u{017F}\u{01DD}-\u{02AF}-]*$";

fn data_attr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DATA_ATTR_PATTERN).expect("valid regex"))
}

/// The allowlist driving a scrub pass.
///
/// Immutable once handed to a [`crate::scrub::Scrubber`]; build a fresh
/// value (or clone and edit) to change the rules. Test suites inject
/// their own policies here instead of touching process-wide state.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Policy {
    /// Element local names allowed to remain in the document
    pub allowed_elements: HashSet<String>,
    /// Element local name -> allowed attribute keys. Keys are
    /// namespace-qualified: `prefix:local` when the attribute carries a
    /// prefix, bare local name otherwise.
    pub allowed_attributes: HashMap<String, HashSet<String>>,
    /// Elements permitted to carry arbitrary `data-*` attributes beyond
    /// their explicit allowlist
    pub data_attribute_elements: HashSet<String>,
}

impl Policy {
    /// The built-in SVG 1.1 allowlist, shared for the process lifetime
    pub fn svg() -> &'static Policy {
        static SVG: OnceLock<Policy> = OnceLock::new();
        SVG.get_or_init(build_svg_policy)
    }

    pub fn allows_element(&self, local_name: &str) -> bool {
        self.allowed_elements.contains(local_name)
    }

    /// Allowed attribute keys for an element, if it has any
    pub fn allowed_attributes(&self, local_name: &str) -> Option<&HashSet<String>> {
        self.allowed_attributes.get(local_name)
    }

    pub fn allows_data_attributes(&self, local_name: &str) -> bool {
        self.data_attribute_elements.contains(local_name)
    }

    /// Check an attribute local name against the data-attribute rule:
    /// `data-` prefix, not reserved (`data-xml...`), valid identifier
    pub fn valid_data_attribute_name(&self, local_name: &str) -> bool {
        let Some(rest) = local_name.strip_prefix("data-") else {
            return false;
        };
        // Reserved prefix; the check is case-sensitive on the literal
        if rest.starts_with("xml") {
            return false;
        }
        data_attr_regex().is_match(local_name)
    }
}

// ----------------------------------------------------------------------
// Built-in SVG 1.1 table
// ----------------------------------------------------------------------

const CORE: &[&str] = &["id", "xml:base", "xml:lang", "xml:space"];

const STYLING: &[&str] = &["class", "style"];

const CONDITIONAL: &[&str] = &["requiredFeatures", "requiredExtensions", "systemLanguage"];

const XLINK: &[&str] = &[
    "xlink:href",
    "xlink:type",
    "xlink:role",
    "xlink:arcrole",
    "xlink:title",
    "xlink:show",
    "xlink:actuate",
];

const PRESENTATION: &[&str] = &[
    "alignment-baseline",
    "baseline-shift",
    "clip",
    "clip-path",
    "clip-rule",
    "color",
    "color-interpolation",
    "color-interpolation-filters",
    "color-profile",
    "color-rendering",
    "cursor",
    "direction",
    "display",
    "dominant-baseline",
    "enable-background",
    "fill",
    "fill-opacity",
    "fill-rule",
    "filter",
    "flood-color",
    "flood-opacity",
    "font-family",
    "font-size",
    "font-size-adjust",
    "font-stretch",
    "font-style",
    "font-variant",
    "font-weight",
    "glyph-orientation-horizontal",
    "glyph-orientation-vertical",
    "image-rendering",
    "kerning",
    "letter-spacing",
    "lighting-color",
    "marker-end",
    "marker-mid",
    "marker-start",
    "mask",
    "opacity",
    "overflow",
    "pointer-events",
    "shape-rendering",
    "stop-color",
    "stop-opacity",
    "stroke",
    "stroke-dasharray",
    "stroke-dashoffset",
    "stroke-linecap",
    "stroke-linejoin",
    "stroke-miterlimit",
    "stroke-opacity",
    "stroke-width",
    "text-anchor",
    "text-decoration",
    "text-rendering",
    "unicode-bidi",
    "visibility",
    "word-spacing",
    "writing-mode",
];

const FILTER_PRIMITIVE: &[&str] = &["x", "y", "width", "height", "result"];

const ANIMATION_TIMING: &[&str] = &[
    "begin",
    "dur",
    "end",
    "min",
    "max",
    "restart",
    "repeatCount",
    "repeatDur",
    "fill",
];

const ANIMATION_VALUE: &[&str] = &[
    "calcMode",
    "values",
    "keyTimes",
    "keySplines",
    "from",
    "to",
    "by",
];

const ANIMATION_ADDITION: &[&str] = &["additive", "accumulate"];

const ANIMATION_TARGET: &[&str] = &["attributeName", "attributeType"];

fn to_set(items: &[&str]) -> HashSet<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn attrs(groups: &[&[&str]]) -> HashSet<String> {
    groups
        .iter()
        .flat_map(|group| group.iter())
        .map(|s| (*s).to_owned())
        .collect()
}

#[rustfmt::skip]
fn build_svg_policy() -> Policy {
    let mut table: HashMap<String, HashSet<String>> = HashMap::new();
    let mut add = |name: &str, groups: &[&[&str]]| {
        table.insert(name.to_owned(), attrs(groups));
    };

    add("a", &[CORE, STYLING, CONDITIONAL, PRESENTATION, XLINK, &["transform", "target"]]);
    add("altGlyph", &[CORE, STYLING, CONDITIONAL, PRESENTATION, XLINK, &["x", "y", "dx", "dy", "rotate", "glyphRef", "format"]]);
    add("altGlyphDef", &[CORE]);
    add("altGlyphItem", &[CORE]);
    add("animate", &[CORE, CONDITIONAL, XLINK, ANIMATION_TIMING, ANIMATION_VALUE, ANIMATION_ADDITION, ANIMATION_TARGET]);
    add("animateColor", &[CORE, CONDITIONAL, XLINK, ANIMATION_TIMING, ANIMATION_VALUE, ANIMATION_ADDITION, ANIMATION_TARGET]);
    add("animateMotion", &[CORE, CONDITIONAL, XLINK, ANIMATION_TIMING, ANIMATION_VALUE, ANIMATION_ADDITION, &["path", "keyPoints", "rotate", "origin"]]);
    add("animateTransform", &[CORE, CONDITIONAL, XLINK, ANIMATION_TIMING, ANIMATION_VALUE, ANIMATION_ADDITION, ANIMATION_TARGET, &["type"]]);
    add("circle", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "cx", "cy", "r"]]);
    add("clipPath", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "clipPathUnits"]]);
    add("color-profile", &[CORE, XLINK, &["name", "local", "rendering-intent"]]);
    add("cursor", &[CORE, CONDITIONAL, XLINK, &["x", "y"]]);
    add("defs", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform"]]);
    add("desc", &[CORE, STYLING]);
    add("ellipse", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "cx", "cy", "rx", "ry"]]);
    add("feBlend", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "in2", "mode"]]);
    add("feColorMatrix", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "type", "values"]]);
    add("feComponentTransfer", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in"]]);
    add("feComposite", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "in2", "operator", "k1", "k2", "k3", "k4"]]);
    add("feConvolveMatrix", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "order", "kernelMatrix", "divisor", "bias", "targetX", "targetY", "edgeMode", "kernelUnitLength", "preserveAlpha"]]);
    add("feDiffuseLighting", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "surfaceScale", "diffuseConstant", "kernelUnitLength"]]);
    add("feDisplacementMap", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "in2", "scale", "xChannelSelector", "yChannelSelector"]]);
    add("feDistantLight", &[CORE, &["azimuth", "elevation"]]);
    add("feFlood", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE]);
    add("feFuncA", &[CORE, &["type", "tableValues", "slope", "intercept", "amplitude", "exponent", "offset"]]);
    add("feFuncB", &[CORE, &["type", "tableValues", "slope", "intercept", "amplitude", "exponent", "offset"]]);
    add("feFuncG", &[CORE, &["type", "tableValues", "slope", "intercept", "amplitude", "exponent", "offset"]]);
    add("feFuncR", &[CORE, &["type", "tableValues", "slope", "intercept", "amplitude", "exponent", "offset"]]);
    add("feGaussianBlur", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "stdDeviation"]]);
    add("feImage", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, XLINK, &["preserveAspectRatio"]]);
    add("feMerge", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE]);
    add("feMergeNode", &[CORE, &["in"]]);
    add("feMorphology", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "operator", "radius"]]);
    add("feOffset", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "dx", "dy"]]);
    add("fePointLight", &[CORE, &["x", "y", "z"]]);
    add("feSpecularLighting", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in", "surfaceScale", "specularConstant", "specularExponent", "kernelUnitLength"]]);
    add("feSpotLight", &[CORE, &["x", "y", "z", "pointsAtX", "pointsAtY", "pointsAtZ", "specularExponent", "limitingConeAngle"]]);
    add("feTile", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["in"]]);
    add("feTurbulence", &[CORE, STYLING, PRESENTATION, FILTER_PRIMITIVE, &["baseFrequency", "numOctaves", "seed", "stitchTiles", "type"]]);
    add("filter", &[CORE, STYLING, PRESENTATION, XLINK, &["x", "y", "width", "height", "filterRes", "filterUnits", "primitiveUnits"]]);
    add("font", &[CORE, STYLING, PRESENTATION, &["horiz-origin-x", "horiz-origin-y", "horiz-adv-x", "vert-origin-x", "vert-origin-y", "vert-adv-y"]]);
    add("font-face", &[CORE, &["font-family", "font-style", "font-variant", "font-weight", "font-stretch", "font-size", "unicode-range", "units-per-em", "panose-1", "stemv", "stemh", "slope", "cap-height", "x-height", "accent-height", "ascent", "descent", "widths", "bbox", "ideographic", "alphabetic", "mathematical", "hanging", "v-ideographic", "v-alphabetic", "v-mathematical", "v-hanging", "underline-position", "underline-thickness", "strikethrough-position", "strikethrough-thickness", "overline-position", "overline-thickness"]]);
    add("font-face-format", &[CORE, &["string"]]);
    add("font-face-name", &[CORE, &["name"]]);
    add("font-face-src", &[CORE]);
    add("font-face-uri", &[CORE, XLINK]);
    add("g", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform"]]);
    add("glyph", &[CORE, STYLING, PRESENTATION, &["d", "horiz-adv-x", "vert-origin-x", "vert-origin-y", "vert-adv-y", "unicode", "glyph-name", "orientation", "arabic-form", "lang"]]);
    add("glyphRef", &[CORE, STYLING, XLINK, &["x", "y", "dx", "dy", "glyphRef", "format"]]);
    add("hkern", &[CORE, &["u1", "g1", "u2", "g2", "k"]]);
    add("image", &[CORE, STYLING, CONDITIONAL, PRESENTATION, XLINK, &["transform", "x", "y", "width", "height", "preserveAspectRatio"]]);
    add("line", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "x1", "y1", "x2", "y2"]]);
    add("linearGradient", &[CORE, STYLING, PRESENTATION, XLINK, &["x1", "y1", "x2", "y2", "gradientUnits", "gradientTransform", "spreadMethod"]]);
    add("marker", &[CORE, STYLING, PRESENTATION, &["viewBox", "preserveAspectRatio", "refX", "refY", "markerUnits", "markerWidth", "markerHeight", "orient"]]);
    add("mask", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["x", "y", "width", "height", "maskUnits", "maskContentUnits"]]);
    add("metadata", &[CORE]);
    add("missing-glyph", &[CORE, STYLING, PRESENTATION, &["d", "horiz-adv-x", "vert-origin-x", "vert-origin-y", "vert-adv-y"]]);
    add("mpath", &[CORE, XLINK]);
    add("path", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "d", "pathLength"]]);
    add("pattern", &[CORE, STYLING, CONDITIONAL, PRESENTATION, XLINK, &["viewBox", "preserveAspectRatio", "x", "y", "width", "height", "patternUnits", "patternContentUnits", "patternTransform"]]);
    add("polygon", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "points"]]);
    add("polyline", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "points"]]);
    add("radialGradient", &[CORE, STYLING, PRESENTATION, XLINK, &["cx", "cy", "r", "fx", "fy", "gradientUnits", "gradientTransform", "spreadMethod"]]);
    add("rect", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "x", "y", "width", "height", "rx", "ry"]]);
    add("set", &[CORE, CONDITIONAL, XLINK, ANIMATION_TIMING, ANIMATION_TARGET, &["to"]]);
    add("stop", &[CORE, STYLING, PRESENTATION, &["offset"]]);
    add("style", &[CORE, &["type", "media", "title"]]);
    add("svg", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["x", "y", "width", "height", "viewBox", "preserveAspectRatio", "zoomAndPan", "version", "baseProfile"]]);
    add("switch", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform"]]);
    add("symbol", &[CORE, STYLING, PRESENTATION, &["viewBox", "preserveAspectRatio"]]);
    add("text", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["transform", "x", "y", "dx", "dy", "rotate", "textLength", "lengthAdjust"]]);
    add("textPath", &[CORE, STYLING, CONDITIONAL, PRESENTATION, XLINK, &["startOffset", "method", "spacing"]]);
    add("title", &[CORE, STYLING]);
    add("tref", &[CORE, STYLING, CONDITIONAL, PRESENTATION, XLINK]);
    add("tspan", &[CORE, STYLING, CONDITIONAL, PRESENTATION, &["x", "y", "dx", "dy", "rotate", "textLength", "lengthAdjust"]]);
    add("use", &[CORE, STYLING, CONDITIONAL, PRESENTATION, XLINK, &["transform", "x", "y", "width", "height"]]);
    add("view", &[CORE, &["viewBox", "preserveAspectRatio", "zoomAndPan", "viewTarget"]]);
    add("vkern", &[CORE, &["u1", "g1", "u2", "g2", "k"]]);

    drop(add);
    Policy {
        allowed_elements: table.keys().cloned().collect(),
        allowed_attributes: table,
        data_attribute_elements: to_set(&["use"]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_table_basics() {
        let policy = Policy::svg();
        assert!(policy.allows_element("svg"));
        assert!(policy.allows_element("circle"));
        assert!(policy.allows_element("use"));
        assert!(!policy.allows_element("script"));
        assert!(!policy.allows_element("foreignObject"));
        assert!(!policy.allows_element("iframe"));
    }

    #[test]
    fn event_handlers_never_allowlisted() {
        let policy = Policy::svg();
        for element in &policy.allowed_elements {
            let attrs = policy.allowed_attributes(element).unwrap();
            assert!(
                !attrs.iter().any(|a| a.starts_with("on")),
                "element {element} allows an event handler attribute"
            );
        }
    }

    #[test]
    fn qualified_keys_in_table() {
        let policy = Policy::svg();
        let use_attrs = policy.allowed_attributes("use").unwrap();
        assert!(use_attrs.contains("xlink:href"));
        assert!(use_attrs.contains("xml:lang"));

        let circle_attrs = policy.allowed_attributes("circle").unwrap();
        assert!(circle_attrs.contains("r"));
        assert!(!circle_attrs.contains("xlink:href"));
    }

    #[test]
    fn only_use_takes_data_attributes() {
        let policy = Policy::svg();
        assert!(policy.allows_data_attributes("use"));
        assert!(!policy.allows_data_attributes("svg"));
        assert!(!policy.allows_data_attributes("circle"));
    }

    #[test]
    fn data_attribute_names() {
        let policy = Policy::svg();
        assert!(policy.valid_data_attribute_name("data-foo"));
        assert!(policy.valid_data_attribute_name("data-foo.bar"));
        assert!(policy.valid_data_attribute_name("data-foo-bar"));
        assert!(policy.valid_data_attribute_name("data-_private"));
        assert!(policy.valid_data_attribute_name("data-caf\u{00E9}"));

        // reserved xml prefix, case-sensitive on the literal
        assert!(!policy.valid_data_attribute_name("data-xmlfoo"));
        // uppercase start fails the identifier rule instead
        assert!(!policy.valid_data_attribute_name("data-XMLfoo"));
        // must start with a lowercase letter or underscore
        assert!(!policy.valid_data_attribute_name("data-1foo"));
        assert!(!policy.valid_data_attribute_name("data-"));
        // no data- prefix at all
        assert!(!policy.valid_data_attribute_name("x-foo"));
    }

    #[test]
    fn injected_policy_is_independent() {
        let mut policy = Policy::default();
        policy.allowed_elements.insert("svg".to_owned());
        assert!(policy.allows_element("svg"));
        assert!(!policy.allows_element("circle"));
        // the shared default is untouched
        assert!(Policy::svg().allows_element("circle"));
    }
}
