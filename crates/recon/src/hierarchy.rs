//! Equipment taxonomy derived from code prefixes.
//!
//! The first character of a code names its series, the first two its
//! sub-series. Labels come from an immutable lookup table built once per
//! process.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::model::{columns, Record};
use crate::table::Table;

/// Builtin series / sub-series labels for ship maintenance codes.
const BUILTIN_LABELS: &[(&str, &str)] = &[
    ("1", "SHIP GENERAL"),
    ("2", "HULL"),
    ("3", "EQUIPMENT FOR CARGO"),
    ("4", "SHIP EQUIPMENT"),
    ("5", "EQUIPMENT FOR CREW AND PASSENGERS"),
    ("6", "MAIN MACHINERY"),
    ("7", "SYSTEMS FOR MACHINERY MAIN COMPONENTS"),
    ("8", "SHIP COMMON SYSTEMS"),
    ("9", "VARIOUS ANALYSIS"),
    ("21", "HULL AFT"),
    ("23", "TANKS SPACES AND STRUCTURES"),
    ("24", "SHELL PLATES TRUNKS ETC"),
    ("25", "DECK HOUSES AND SUPERSTRUCTURES"),
    ("26", "HULL OUTFITTING"),
    ("27", "MATERIAL PROTECTION EXTERNAL"),
    ("28", "CARGO AREA"),
    ("30", "HATCHES PORTS"),
    ("31", "EQUIPMENT FOR CARGO IN HOLDS/ON DECK"),
    ("32", "SPECIAL CARGO HANDLING EQUIPMENT"),
    ("33", "DECK CRANES FOR CARGO"),
    ("35", "LOADING/DISCHARGING SYSTEMS FOR LIQUID CARGO"),
    ("36", "FREEZING REFRIGERATING & HEATING SYSTEMS FOR CARGO"),
    ("37", "GAS/VENTILATION SYSTEMS FOR CARGO HOLDS/TANKS"),
    ("38", "AUXILIARY SYSTEMS & EQUIPMENT FOR CARGO"),
    ("39", "OIL DISCHARGE MONITORING"),
    ("40", "MANOEUVRING MACHINERY & EQUIPMENT"),
    ("41", "NAVIGATION & SEARCHING EQUIPMENT"),
    ("42", "COMMUNICATION EQUIPMENTS"),
    ("43", "ANCHORING MOORING & TOWING EQUIPMENT"),
    ("44", "REP./MAINT./CLEAN. EQUIP. WORKSHOP/STORE OUTFIT NAME PLATES"),
    ("45", "LIFTING & TRANSPORT EQUIPMENT FOR MACHINERY COMPONENTS"),
    ("48", "SPECIAL EQUIPMENT"),
    ("50", "LIFESAVING PROTECTION & MEDICAL EQUIPMENT"),
    ("51", "INSULATION PANELS BULKHEADS DOORS SIDESCUTTLES SKYLIGHTS"),
    ("54", "FURNITURE INVENTORY ENTERTAINMENT EQUIPMENT"),
    ("55", "GALLEY/PANTRY EQUIP. PROVISION PLANTS LAUNDRY/IRONING EQU."),
    ("56", "TRANSPORT EQUIPMENT FOR CREW PASSENGERS & PROVISIONS"),
    ("57", "VENTILATION AIR-CONDITIONING & HEATING SYSTEMS"),
    ("58", "SANITARY SYST. W/DISCHARGES ACCOMMODATION DRAIN SYSTEMS"),
    ("60", "DIESEL ENGINES FOR PROPULSION"),
    ("62", "OTHER TYPES OF PROPULSION MACHINERY"),
    ("63", "PROPELLERS TRANSMISSIONS FOILS"),
    ("64", "BOILERS STEAM & GAS GENERATORS"),
    ("65", "MOTOR AGGREGATES FOR MAIN ELECTRIC POWER PRODUCTION"),
    ("66", "OTHER AGGR. & GEN. FOR MAIN & EMERGENCY EL. POWER PRODUCTION"),
    ("70", "FUEL SYSTEMS"),
    ("71", "LUBE OIL SYSTEMS"),
    ("72", "COOLING SYSTEMS"),
    ("73", "COMPRESSED AIR SYSTEMS"),
    ("74", "EXHAUST SYSTEMS & AIR INTAKES"),
    ("75", "STEAM CONDENSATE & FEED WATER SYSTEMS"),
    ("76", "DISTILLED & MAKE-UP WATER SYSTEMS"),
    ("79", "AUTOMATION SYSTEMS FOR MACHINERY"),
    ("80", "BALLAST & BILGE SYSTEMS GUTTER PIPES OUTSIDE ACCOMMOD."),
    ("81", "FIRE & LIFEBOAT ALARM FIRE FIGHTING & WASH DOWN SYSTEMS"),
    ("83", "SPECIAL COMMON HYDRAULIC OIL SYSTEMS"),
    ("85", "General Purpose Equipments"),
    ("88", "COMMON ELECTRICAL SYSTEMS"),
    ("89", "LIGHTING SYSTEM"),
    ("101", "BDP"),
    ("102", "BALLAST WATER REPORTS"),
    ("103", "CARGO DOCUMENTATION"),
    ("104", "CHPC – CARGO HANDLING PROCEDURES – CHEMICAL TANKERS"),
    ("105", "CARGO HANDLING PROCEDURES – GAS CARRIERS"),
    ("106", "CARGO HANDLING PROCEDURES – LNG CARRIERS"),
    ("107", "CARGO HANDLING PROCEDURES - PCC"),
    ("108", "CARGO HANDLING PROCEDURES - TANKERS"),
    ("109", "CARGO HANDLING PROCEDURES - WCC"),
    ("110", "COVID-19 MANAGEMENT PLAN"),
    ("111", "CYBER SECURITY PROCEDURES CYSM"),
    ("112", "EMERGENCY CONTINGENCY PROCEDURE"),
    ("113", "ENVIRONMENTAL MANAGEMENT SYSTEM"),
    ("114", "ENGINE ROOM PROCEDURES"),
    ("115", "EMERGENCY TOWING PROCEDURE MANUAL"),
    ("116", "GARBAGE MANAGEMENT PLAN"),
    ("117", "ICE CLASS VESSEL PROCEDURES"),
    ("118", "INVENTORY OF HAZARDOUS MATERIAL MANAGEMENT PLAN"),
    ("119", "OFFICE MANAGEMENT PROCEDURES"),
    ("120", "SHIP ENERGY EFFICIENCY MANAGEMENT PLAN"),
    ("121", "SHIP MANAGEMENT PROCEDURES"),
    ("122", "SHIPBOARD MARINE POLLUTION EMERGENCY PLAN"),
    ("123", "SHIPBOARD OIL POLLUTION EMERGENCY PLAN"),
    ("124", "SHIP TO SHIP TRANSFER OPERATION PLAN"),
    ("125", "VESSEL GENERAL PERMIT"),
    ("126", "VOC MANAGEMENT PLAN"),
    ("900", "LO ANALYSIS"),
    ("902", "FO ANALYSIS"),
    ("904", "WATER ANALYSIS"),
    ("AP", "ALL PUMPS"),
    ("CEN", "CENTRIFUGAL PUMPS"),
    ("GRP", "GEAR PUMP"),
    ("PDP", "PNEUMATIC DIAPHRAGM PUMP"),
    ("PIS", "PISTON PUMPS"),
    ("SCR", "SCREW PUMPS"),
    ("VAN", "VANE PUMP"),
];

static BUILTIN: Lazy<Taxonomy> = Lazy::new(|| Taxonomy::from_pairs(BUILTIN_LABELS.iter().copied()));

/// Read-only taxonomy code -> label table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    labels: HashMap<String, String>,
}

impl Taxonomy {
    /// The process-wide builtin table.
    pub fn builtin() -> &'static Taxonomy {
        &BUILTIN
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Copy of this table with `overrides` layered on top.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, String>) -> Taxonomy {
        let mut labels = self.labels.clone();
        labels.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        Self { labels }
    }

    pub fn label(&self, code: &str) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Taxonomy level, by code prefix width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Series,
    SubSeries,
}

impl Depth {
    pub fn width(self) -> usize {
        match self {
            Self::Series => 1,
            Self::SubSeries => 2,
        }
    }

    fn headers(self) -> [&'static str; 2] {
        match self {
            Self::Series => ["Series", "Series Name"],
            Self::SubSeries => ["Sub Series", "Sub Series Name"],
        }
    }
}

/// First `width` characters of `code` (all of it when shorter).
pub fn code_prefix(code: &str, width: usize) -> &str {
    match code.char_indices().nth(width) {
        Some((end, _)) => &code[..end],
        None => code,
    }
}

/// Per-record classification, one row per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    /// 0-based position in the input records.
    pub row: usize,
    pub equipment_code: String,
    pub series: String,
    pub sub_series: String,
    pub series_label: Option<String>,
    pub sub_series_label: Option<String>,
}

/// Classify `(row, record)` pairs at both depths, keeping their order.
pub fn classify_records<'a, I>(records: I, taxonomy: &Taxonomy) -> Vec<TreeRow>
where
    I: IntoIterator<Item = (usize, &'a Record)>,
{
    records
        .into_iter()
        .map(|(row, record)| {
            let code = record.equipment_code();
            let series = code_prefix(&code, Depth::Series.width()).to_string();
            let sub_series = code_prefix(&code, Depth::SubSeries.width()).to_string();
            TreeRow {
                row,
                series_label: taxonomy.label(&series).map(str::to_owned),
                sub_series_label: taxonomy.label(&sub_series).map(str::to_owned),
                equipment_code: code,
                series,
                sub_series,
            }
        })
        .collect()
}

pub fn tree_table(rows: &[TreeRow]) -> Table {
    let [series_header, series_label] = Depth::Series.headers();
    let [sub_header, sub_label] = Depth::SubSeries.headers();
    let mut table = Table::new(vec![
        columns::EQUIPMENT_CODE.into(),
        series_header.into(),
        series_label.into(),
        sub_header.into(),
        sub_label.into(),
    ]);
    for r in rows {
        table.push_row(vec![
            r.equipment_code.clone(),
            r.series.clone(),
            r.series_label.clone().unwrap_or_default(),
            r.sub_series.clone(),
            r.sub_series_label.clone().unwrap_or_default(),
        ]);
    }
    table
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupCount {
    /// 1-based, presentation only.
    pub index: usize,
    pub code: String,
    /// `None` when the taxonomy has no entry for `code`.
    pub label: Option<String>,
    pub job_count: usize,
}

/// Count records per (prefix, label) at `depth`, groups in order of first
/// appearance.
pub fn group_counts<'a, I>(records: I, taxonomy: &Taxonomy, depth: Depth) -> Vec<GroupCount>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupCount> = Vec::new();

    for record in records {
        let code = record.equipment_code();
        let prefix = code_prefix(&code, depth.width());
        match slots.get(prefix) {
            Some(&slot) => groups[slot].job_count += 1,
            None => {
                slots.insert(prefix.to_string(), groups.len());
                groups.push(GroupCount {
                    index: groups.len() + 1,
                    code: prefix.to_string(),
                    label: taxonomy.label(prefix).map(str::to_owned),
                    job_count: 1,
                });
            }
        }
    }

    groups
}

/// Series analysis: job counts per top-level series.
pub fn classify<'a, I>(records: I, taxonomy: &Taxonomy) -> Vec<GroupCount>
where
    I: IntoIterator<Item = &'a Record>,
{
    group_counts(records, taxonomy, Depth::Series)
}

pub fn group_table(groups: &[GroupCount], depth: Depth) -> Table {
    let [code_header, label_header] = depth.headers();
    let mut table = Table::new(vec![
        "#".into(),
        code_header.into(),
        label_header.into(),
        "Job Count".into(),
    ]);
    for g in groups {
        table.push_row(vec![
            g.index.to_string(),
            g.code.clone(),
            g.label.clone().unwrap_or_default(),
            g.job_count.to_string(),
        ]);
    }
    table
}
