//! Report presets
//!
//! Each platform report is a document type plus a few fixed wire fields, the
//! pipeline options of its group and an optional rule tying `in_Domain` to
//! `out_Domain`. Presets seed a [`ParamsBuilder`]; callers add the window and
//! domains.

use serde::Serialize;

use crate::params::{
    validate_domain_equality, DomainRule, ParamsBuilder, ParamsError, QueryOptions, QueryParams,
    ReportGroup,
};

/// One report of the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportPreset {
    /// Transparency regulation article (e.g. `12.1.D`)
    pub code: &'static str,
    pub name: &'static str,
    /// Data domain the report belongs to
    pub area: &'static str,
    /// `documentType`
    pub document_type: &'static str,
    /// Further fixed wire fields
    pub fixed: &'static [(&'static str, &'static str)],
    pub group: ReportGroup,
    pub domain_rule: Option<DomainRule>,
    /// Whether the report is served in offset pages
    pub paginated: bool,
}

impl ReportPreset {
    const fn new(
        code: &'static str,
        name: &'static str,
        area: &'static str,
        document_type: &'static str,
        fixed: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            code,
            name,
            area,
            document_type,
            fixed,
            group: ReportGroup::Default,
            domain_rule: None,
            paginated: false,
        }
    }

    const fn group(mut self, group: ReportGroup) -> Self {
        self.group = group;
        self
    }

    const fn rule(mut self, rule: DomainRule) -> Self {
        self.domain_rule = Some(rule);
        self
    }

    const fn paged(mut self) -> Self {
        self.paginated = true;
        self
    }

    /// Builder holding the fixed fields, and `offset=0` for paged reports
    pub fn builder(&self) -> ParamsBuilder {
        let builder = self
            .fixed
            .iter()
            .fold(ParamsBuilder::new(self.document_type), |builder, (key, value)| {
                builder.param(*key, *value)
            });
        if self.paginated {
            builder.offset(0)
        } else {
            builder
        }
    }

    /// Pipeline options of the report's group
    pub fn options(&self) -> QueryOptions {
        self.group.options()
    }

    /// Check the report's domain rule against finished parameters
    pub fn validate(&self, params: &QueryParams) -> Result<(), ParamsError> {
        match self.domain_rule {
            Some(rule) => validate_domain_equality(params, rule),
            None => Ok(()),
        }
    }
}

const LOAD: &str = "Load";
const GENERATION: &str = "Generation";
const MARKET: &str = "Market";
const TRANSMISSION: &str = "Transmission";
const BALANCING: &str = "Balancing";
const OUTAGES: &str = "Outages";
const MASTER_DATA: &str = "Master data";

static PRESETS: &[ReportPreset] = &[
    // Load
    ReportPreset::new("6.1.A", "Actual total load", LOAD, "A65", &[("processType", "A16")]),
    ReportPreset::new("6.1.B", "Day-ahead total load forecast", LOAD, "A65", &[("processType", "A01")]),
    ReportPreset::new("6.1.C", "Week-ahead total load forecast", LOAD, "A65", &[("processType", "A31")]),
    ReportPreset::new("6.1.D", "Month-ahead total load forecast", LOAD, "A65", &[("processType", "A32")]),
    ReportPreset::new("6.1.E", "Year-ahead total load forecast", LOAD, "A65", &[("processType", "A33")]),
    // Generation
    ReportPreset::new("14.1.A", "Installed capacity per production type", GENERATION, "A68", &[("processType", "A33")])
        .group(ReportGroup::MasterData),
    ReportPreset::new("14.1.B", "Installed capacity per production unit", GENERATION, "A71", &[("processType", "A33")]),
    ReportPreset::new("14.1.C", "Generation forecast day ahead", GENERATION, "A71", &[("processType", "A01")]),
    ReportPreset::new("14.1.D", "Wind and solar generation forecast", GENERATION, "A69", &[("processType", "A01")]),
    ReportPreset::new("16.1.A", "Actual generation per generation unit", GENERATION, "A73", &[("processType", "A16")])
        .group(ReportGroup::UnitLevel),
    ReportPreset::new("16.1.B_C", "Actual generation per production type", GENERATION, "A75", &[("processType", "A16")]),
    ReportPreset::new("16.1.D", "Water reservoirs and hydro storage plants", GENERATION, "A72", &[("processType", "A16")]),
    // Market
    ReportPreset::new("12.1.D", "Energy prices", MARKET, "A44", &[])
        .rule(DomainRule::MustEqual)
        .paged(),
    ReportPreset::new("12.1.E", "Implicit allocations congestion income", MARKET, "A25", &[("businessType", "B10")])
        .rule(DomainRule::MustEqual),
    ReportPreset::new("12.1.B", "Total nominated capacity", MARKET, "A26", &[("businessType", "B08")])
        .rule(DomainRule::MustDiffer),
    ReportPreset::new("12.1.C", "Total capacity already allocated", MARKET, "A26", &[("businessType", "A29")])
        .rule(DomainRule::MustDiffer),
    ReportPreset::new("11.1.A", "Explicit allocations offered capacity", MARKET, "A31", &[("auction.Type", "A02")])
        .rule(DomainRule::MustDiffer),
    // Transmission
    ReportPreset::new("12.1.G", "Cross-border physical flows", TRANSMISSION, "A11", &[])
        .rule(DomainRule::MustDiffer),
    ReportPreset::new("12.1.F", "Commercial schedules", TRANSMISSION, "A09", &[("contract_MarketAgreement.Type", "A01")])
        .rule(DomainRule::MustDiffer),
    ReportPreset::new("11.1", "Forecasted transfer capacities", TRANSMISSION, "A61", &[])
        .rule(DomainRule::MustDiffer),
    ReportPreset::new("11.1.B", "Flow-based allocations", TRANSMISSION, "B09", &[("processType", "A44")]),
    // Balancing
    ReportPreset::new("17.1.B_C", "Volumes and prices of contracted reserves", BALANCING, "A81", &[("businessType", "B95")])
        .paged(),
    ReportPreset::new("17.1.D", "Accepted aggregated offers", BALANCING, "A82", &[]),
    ReportPreset::new("17.1.E", "Activated balancing energy", BALANCING, "A83", &[]),
    ReportPreset::new("17.1.F", "Prices of activated balancing energy", BALANCING, "A84", &[]),
    ReportPreset::new("17.1.G", "Imbalance prices", BALANCING, "A85", &[]),
    ReportPreset::new("17.1.H", "Total imbalance volumes", BALANCING, "A86", &[]),
    ReportPreset::new("17.1.I", "Financial expenses and income for balancing", BALANCING, "A87", &[]),
    ReportPreset::new("17.1.J", "Cross-border balancing", BALANCING, "A88", &[]),
    ReportPreset::new("12.3.B_C", "Balancing energy bids", BALANCING, "A37", &[("businessType", "B74")])
        .paged(),
    ReportPreset::new("12.3.E", "Aggregated balancing energy bids", BALANCING, "A24", &[]),
    ReportPreset::new("12.3.F", "Procured balancing capacity", BALANCING, "A15", &[])
        .paged(),
    // Outages
    ReportPreset::new("7.1.A_B", "Unavailability of consumption units", OUTAGES, "A76", &[])
        .group(ReportGroup::Outages)
        .paged(),
    ReportPreset::new("10.1.A_B", "Unavailability of transmission infrastructure", OUTAGES, "A78", &[])
        .group(ReportGroup::Outages)
        .paged(),
    ReportPreset::new("10.1.C", "Unavailability of offshore grid infrastructure", OUTAGES, "A79", &[])
        .group(ReportGroup::Outages)
        .paged(),
    ReportPreset::new("15.1.A_B", "Unavailability of generation units", OUTAGES, "A80", &[])
        .group(ReportGroup::Outages)
        .paged(),
    ReportPreset::new("15.1.C_D", "Unavailability of production units", OUTAGES, "A77", &[])
        .group(ReportGroup::Outages)
        .paged(),
    // Master data
    ReportPreset::new("A95", "Production and generation units", MASTER_DATA, "A95", &[("businessType", "B11")])
        .group(ReportGroup::MasterData),
];

/// Every preset in table order
pub fn all() -> &'static [ReportPreset] {
    PRESETS
}

/// Look up a preset by code, ignoring case
pub fn find(code: &str) -> Option<&'static ReportPreset> {
    let code = code.trim();
    PRESETS
        .iter()
        .find(|preset| preset.code.eq_ignore_ascii_case(code))
}
