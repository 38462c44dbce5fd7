//! Hold entry classification
//!
//! An arrival is assigned to a stack by the last two fixes of its route.
//! Each recognized suffix names exactly one stack and one rewrite: replace
//! the last leg with the stack's fix and hold legs, or append them.

use crate::airspace::Airspace;
use crate::dispatch::config::{DispatchConfig, EntryAction};
use crate::dispatch::engine::DispatchError;
use crate::hold::StackId;
use crate::models::route::{Leg, Route, WaypointId};

/// Entry rule with waypoint and stack names resolved
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMatch {
    pub second_last: WaypointId,
    pub last: WaypointId,
    pub stack: StackId,
    pub action: EntryAction,
    pub clear_speed_restriction: bool,
}

impl EntryMatch {
    /// Copy `route` with the stack's legs spliced in
    pub fn rewrite(&self, route: &Route, (fix_leg, hold_leg): (Leg, Leg)) -> Route {
        let mut rewritten = route.clone();
        if self.action == EntryAction::ReplaceLast {
            rewritten.pop();
        }
        rewritten.push(fix_leg);
        rewritten.push(hold_leg);
        if self.clear_speed_restriction {
            rewritten.deactivate_speed_restriction_from_end(3);
        }
        rewritten
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryRuleSet {
    rules: Vec<EntryMatch>,
}

impl EntryRuleSet {
    /// Resolve configured names against the airspace
    pub fn resolve(config: &DispatchConfig, airspace: &dyn Airspace) -> Result<Self, DispatchError> {
        let lookup = |name: &str| {
            airspace
                .waypoint_id(name)
                .ok_or_else(|| DispatchError::UnknownWaypoint(name.to_string()))
        };

        let mut rules = Vec::with_capacity(config.entry_rules.len());
        for rule in &config.entry_rules {
            let stack = config
                .stack_index(&rule.stack)
                .ok_or_else(|| DispatchError::UnknownStack(rule.stack.clone()))?;
            rules.push(EntryMatch {
                second_last: lookup(&rule.second_last)?,
                last: lookup(&rule.last)?,
                stack: StackId(stack),
                action: rule.action,
                clear_speed_restriction: rule.clear_speed_restriction,
            });
        }
        Ok(Self { rules })
    }

    pub fn from_matches(rules: Vec<EntryMatch>) -> Self {
        Self { rules }
    }

    /// Rule whose suffix matches the route's last two waypoint legs
    pub fn match_route(&self, route: &Route) -> Option<&EntryMatch> {
        let (Some(second_last), Some(last)) = route.last_two_fixes()? else {
            return None;
        };
        self.rules
            .iter()
            .find(|r| r.second_last == second_last && r.last == last)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
