// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Closed set of diagram kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Diagram {
    UserStoryMap,
    OpportunityCanvas,
    BusinessModelCanvas,
    Fourls,
    StartStopContinue,
    Kpt,
    UserPersona,
    MindMap,
    EmpathyMap,
    SiteMap,
    GanttChart,
    ImpactMap,
    ErDiagram,
    Kanban,
    Table,
    SequenceDiagram,
    Freeform,
    UseCaseDiagram,
    KeyboardLayout,
}

impl Diagram {
    pub const ALL: [Diagram; 19] = [
        Diagram::UserStoryMap,
        Diagram::OpportunityCanvas,
        Diagram::BusinessModelCanvas,
        Diagram::Fourls,
        Diagram::StartStopContinue,
        Diagram::Kpt,
        Diagram::UserPersona,
        Diagram::MindMap,
        Diagram::EmpathyMap,
        Diagram::SiteMap,
        Diagram::GanttChart,
        Diagram::ImpactMap,
        Diagram::ErDiagram,
        Diagram::Kanban,
        Diagram::Table,
        Diagram::SequenceDiagram,
        Diagram::Freeform,
        Diagram::UseCaseDiagram,
        Diagram::KeyboardLayout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Diagram::UserStoryMap => "USER_STORY_MAP",
            Diagram::OpportunityCanvas => "OPPORTUNITY_CANVAS",
            Diagram::BusinessModelCanvas => "BUSINESS_MODEL_CANVAS",
            Diagram::Fourls => "FOURLS",
            Diagram::StartStopContinue => "START_STOP_CONTINUE",
            Diagram::Kpt => "KPT",
            Diagram::UserPersona => "USER_PERSONA",
            Diagram::MindMap => "MIND_MAP",
            Diagram::EmpathyMap => "EMPATHY_MAP",
            Diagram::SiteMap => "SITE_MAP",
            Diagram::GanttChart => "GANTT_CHART",
            Diagram::ImpactMap => "IMPACT_MAP",
            Diagram::ErDiagram => "ER_DIAGRAM",
            Diagram::Kanban => "KANBAN",
            Diagram::Table => "TABLE",
            Diagram::SequenceDiagram => "SEQUENCE_DIAGRAM",
            Diagram::Freeform => "FREEFORM",
            Diagram::UseCaseDiagram => "USE_CASE_DIAGRAM",
            Diagram::KeyboardLayout => "KEYBOARD_LAYOUT",
        }
    }
}

impl fmt::Display for Diagram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Diagram {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Diagram::ALL
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| Error::invalid(format!("invalid diagram type: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_parses_back() {
        for diagram in Diagram::ALL {
            assert_eq!(diagram.as_str().parse::<Diagram>().unwrap(), diagram);
        }
    }

    #[test]
    fn serde_matches_as_str() {
        let json = serde_json::to_string(&Diagram::ErDiagram).unwrap();
        assert_eq!(json, "\"ER_DIAGRAM\"");
        let json = serde_json::to_string(&Diagram::Fourls).unwrap();
        assert_eq!(json, "\"FOURLS\"");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "FLOW_CHART".parse::<Diagram>().unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!("mind_map".parse::<Diagram>().is_err());
    }
}
