//! Static code → name tables for metadata rendering
//!
//! Three lookup families: EXIF vendor-extension tags layered over the
//! standard tag set, IPTC-IIM `(record, dataset)` property names, and
//! Photoshop Image Resource Block resource IDs. Unknown codes always fall
//! back to printing the raw number at the call site.

/// Rendering intents as defined by ICC and mirrored by EXIF tag 771,
/// indexed by intent value 0..=3.
pub const RENDERING_INTENT: [&str; 4] = [
    "Perceptual",
    "Relative colorimetric",
    "Saturation",
    "Absolute colorimetric",
];

/// EXIF tag names not in the standard set: PNG-private pixel-unit tags and
/// two otherwise-unnamed codes seen in the wild.
pub fn exif_extra_tag_name(code: u16) -> Option<&'static str> {
    match code {
        769 => Some("Exif 0x0301"),
        771 => Some("Rendering Intent"),
        20752 => Some("Pixel Units"),
        20753 => Some("Pixels Per Unit X"),
        20754 => Some("Pixels Per Unit Y"),
        _ => None,
    }
}

/// IPTC-IIM `(record, dataset)` → property name, the subset of the IPTC
/// Photo Metadata 2023.2 reference that shows up in legacy files.
pub fn iim_name(record: u8, dataset: u8) -> Option<&'static str> {
    match (record, dataset) {
        (2, 4) => Some("intellectualGenre"),
        (2, 5) => Some("title"),
        (2, 12) => Some("subjectCodes"),
        (2, 25) => Some("keywords"),
        (2, 40) => Some("instructions"),
        (2, 55) => Some("dateCreated"),
        (2, 80) => Some("creatorNames"),
        (2, 85) => Some("jobtitle"),
        (2, 90) => Some("cityName"),
        (2, 92) => Some("sublocationName"),
        (2, 95) => Some("provinceState"),
        (2, 100) => Some("countryCode"),
        (2, 101) => Some("countryName"),
        (2, 103) => Some("jobid"),
        (2, 105) => Some("headline"),
        (2, 110) => Some("creditLine"),
        (2, 115) => Some("source"),
        (2, 116) => Some("copyrightNotice"),
        (2, 120) => Some("description"),
        (2, 122) => Some("captionWriter"),
        _ => None,
    }
}

/// Photoshop Image Resource Block resource ID → resource name.
pub fn psd_resource_name(id: u16) -> Option<&'static str> {
    match id {
        1000 => Some("Ps2Info"),
        1001 => Some("MacPrintManagerInfo"),
        1002 => Some("MacPageFormatInfo"),
        1003 => Some("Ps2IndexedColorTable"),
        1005 => Some("ResolutionInfo"),
        1006 => Some("AlphaChannelsNames"),
        1007 => Some("OldDisplayInfo"),
        1008 => Some("Caption"),
        1009 => Some("BorderInfo"),
        1010 => Some("BackgroundColor"),
        1011 => Some("PrintFlags"),
        1012 => Some("GrayscaleAndMultichannelHalftoningInfo"),
        1013 => Some("ColorHalftoningInfo"),
        1014 => Some("DuotoneHalftoningInfo"),
        1015 => Some("GrayscaleAndMultichannelTransferFunction"),
        1016 => Some("ColorTransferFunctions"),
        1017 => Some("DuotoneTransferFunctions"),
        1018 => Some("DuotoneImageInfo"),
        1019 => Some("EffectiveBlackAndWhiteValues"),
        1021 => Some("EpsOptions"),
        1022 => Some("QuickMaskInfo"),
        1024 => Some("LayerStateInfo"),
        1025 => Some("WorkingPath"),
        1026 => Some("LayersGroupInfo"),
        1028 => Some("UptcNaaRecord"),
        1029 => Some("RawFormatFilesImageMode"),
        1030 => Some("JpegQuality"),
        1032 => Some("GridAndGuidesInfo"),
        1033 => Some("Ps4Thumbnail"),
        1034 => Some("CopyrightFlag"),
        1035 => Some("Url"),
        1036 => Some("Thumbnail"),
        1037 => Some("GlobalAngle"),
        1039 => Some("IccProfile"),
        1040 => Some("Watermark"),
        1041 => Some("IccUntaggedProfile"),
        1042 => Some("EffectsVisible"),
        1043 => Some("SpotHalftone"),
        1044 => Some("IdSeedNumber"),
        1045 => Some("UnicodeAlphaNames"),
        1046 => Some("IndexedColorTableCount"),
        1047 => Some("TransparencyIndex"),
        1049 => Some("GlobalAltitude"),
        1050 => Some("Slices"),
        1051 => Some("WorkflowUrl"),
        1052 => Some("JumpToXpep"),
        1053 => Some("AlphaIndentifiers"),
        1054 => Some("UrlList"),
        1057 => Some("VersionInfo"),
        1058 => Some("ExifData1"),
        1059 => Some("ExifData3"),
        1060 => Some("XmpMetadata"),
        1061 => Some("CaptionDigest"),
        1062 => Some("PrintScale"),
        1064 => Some("PixelAspectRatio"),
        1065 => Some("LayerComps"),
        1066 => Some("AlternateDuotoneColors"),
        1067 => Some("AlternateSpotColors"),
        1069 => Some("LayerSelectionIds"),
        1070 => Some("HdrToningInfo"),
        1071 => Some("PrintInfo"),
        1072 => Some("LayerGroupsEnabledId"),
        1073 => Some("ColorSamplers"),
        1074 => Some("MeasurementScale"),
        1075 => Some("TimelineInfo"),
        1076 => Some("SheetDisclosure"),
        1077 => Some("DisplayInfo"),
        1078 => Some("OnionSkins"),
        1080 => Some("CountInfo"),
        1082 => Some("PrintSettings"),
        1083 => Some("PrintStyle"),
        1084 => Some("NsPrintInfo"),
        1086 => Some("AutoSaveFilePath"),
        1087 => Some("AutoSaveFormat"),
        1088 => Some("PathSelectionState"),
        2999 => Some("ClippingPathName"),
        3000 => Some("OriginPathInfo"),
        10000 => Some("PrintFlagsInfo"),
        _ => None,
    }
}

/// IRB resource ID holding the embedded IPTC-IIM block.
pub const IRB_IPTC_NAA: u16 = 1028;

/// IRB resource ID holding an XMP packet.
pub const IRB_XMP: u16 = 1060;
