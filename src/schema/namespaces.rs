//! Published document namespaces

use super::SchemaType;

/// Acknowledgement namespace (IEC 62325-451-1, version 7.0)
pub const ACKNOWLEDGEMENT_7_0: &str =
    "urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:7:0";

/// Acknowledgement namespace (IEC 62325-451-1, version 8.1)
pub const ACKNOWLEDGEMENT_8_1: &str =
    "urn:iec62325.351:tc57wg16:451-1:acknowledgementdocument:8:1";

/// Publication documents: prices, schedules, allocations
pub const PUBLICATION_7_0: &str = "urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:0";

/// Publication documents, revision 7.3
pub const PUBLICATION_7_3: &str = "urn:iec62325.351:tc57wg16:451-3:publicationdocument:7:3";

/// Capacity documents
pub const CAPACITY_8_0: &str = "urn:iec62325.351:tc57wg16:451-3:capacitydocument:8:0";

/// Generation and load documents
pub const GENERATION_LOAD_3_0: &str =
    "urn:iec62325.351:tc57wg16:451-6:generationloaddocument:3:0";

/// Unavailability (outage) documents
pub const OUTAGE_3_0: &str = "urn:iec62325.351:tc57wg16:451-6:outagedocument:3:0";

/// Balancing documents
pub const BALANCING_3_0: &str = "urn:iec62325.351:tc57wg16:451-6:balancingdocument:3:0";

/// Balancing documents, revision 4.1
pub const BALANCING_4_1: &str = "urn:iec62325.351:tc57wg16:451-6:balancingdocument:4:1";

/// Transmission network documents
pub const TRANSMISSION_NETWORK_3_0: &str =
    "urn:iec62325.351:tc57wg16:451-6:transmissionnetworkdocument:3:0";

/// Configuration (master data) documents
pub const CONFIGURATION_3_0: &str =
    "urn:iec62325.351:tc57wg16:451-6:configurationdocument:3:0";

/// Schemas known to [`super::SchemaRegistry::standard`]
pub const STANDARD_SCHEMAS: &[SchemaType] = &[
    SchemaType::acknowledgement("Acknowledgement_MarketDocument", ACKNOWLEDGEMENT_7_0),
    SchemaType::acknowledgement("Acknowledgement_MarketDocument_8_1", ACKNOWLEDGEMENT_8_1),
    SchemaType::market("Publication_MarketDocument", PUBLICATION_7_0),
    SchemaType::market("Publication_MarketDocument_7_3", PUBLICATION_7_3),
    SchemaType::market("Capacity_MarketDocument", CAPACITY_8_0),
    SchemaType::market("GL_MarketDocument", GENERATION_LOAD_3_0),
    SchemaType::market("Unavailability_MarketDocument", OUTAGE_3_0),
    SchemaType::market("Balancing_MarketDocument", BALANCING_3_0),
    SchemaType::market("Balancing_MarketDocument_4_1", BALANCING_4_1),
    SchemaType::market("TransmissionNetwork_MarketDocument", TRANSMISSION_NETWORK_3_0),
    SchemaType::market("Configuration_MarketDocument", CONFIGURATION_3_0),
];
