use super::config::{RiskRule, MAX_FACTOR_POINTS};
use super::context::{Level, RiskFactorContext, NATIONAL_COST_OF_LIVING_INDEX};

const ELEVATED_PERCENTILE: f64 = 75.0;
const EXCESSIVE_PERCENTILE: f64 = 90.0;
const LOW_PRODUCTIVITY_PERCENTILE: f64 = 25.0;
const MEDIAN_PERCENTILE: f64 = 50.0;
const MATERIAL_GAP: f64 = 10.0;
const SEVERE_GAP: f64 = 25.0;
const SENIOR_EXPERIENCE_YEARS: u32 = 5;

/// Additive raw score for a rule, clamped to `MAX_FACTOR_POINTS`.
pub(crate) fn raw_score(rule: RiskRule, context: &RiskFactorContext) -> u8 {
    let score = match rule {
        RiskRule::CompensationLevel => compensation_level(context),
        RiskRule::ProductivityAlignment => productivity_alignment(context),
        RiskRule::MarketJustification => market_justification(context),
        RiskRule::ProviderQualifications => provider_qualifications(context),
        RiskRule::RegulatoryCompliance => regulatory_compliance(context),
        RiskRule::Documentation => documentation(context),
        RiskRule::BusinessCase => business_case(context),
    };
    score.min(MAX_FACTOR_POINTS)
}

fn compensation_level(context: &RiskFactorContext) -> u8 {
    let pct = &context.compensation;
    let mut score = 0;
    if pct.tcc > EXCESSIVE_PERCENTILE {
        score += 2;
    } else if pct.tcc > ELEVATED_PERCENTILE {
        score += 1;
    }
    if pct.conversion_factor > EXCESSIVE_PERCENTILE {
        score += 1;
    }
    score
}

fn productivity_alignment(context: &RiskFactorContext) -> u8 {
    let pct = &context.compensation;
    let gap = pct.tcc - pct.wrvu;
    let mut score = 0;
    if gap > SEVERE_GAP {
        score += 2;
    } else if gap > MATERIAL_GAP {
        score += 1;
    }
    if pct.wrvu < LOW_PRODUCTIVITY_PERCENTILE && pct.tcc > MEDIAN_PERCENTILE {
        score += 1;
    }
    if quality_below_benchmark(context) && pct.tcc > ELEVATED_PERCENTILE {
        score += 1;
    }
    score
}

fn market_justification(context: &RiskFactorContext) -> u8 {
    let tcc = context.compensation.tcc;
    if tcc <= ELEVATED_PERCENTILE {
        return 0;
    }

    let market = &context.market;
    let mut score = 0;
    if market.demand == Level::Low {
        score += 1;
    }
    if market.competition == Level::Low {
        score += 1;
    }
    if market.recruitment_difficulty == Level::Low {
        score += 1;
    }
    if market.cost_of_living_index < NATIONAL_COST_OF_LIVING_INDEX && tcc > EXCESSIVE_PERCENTILE {
        score += 1;
    }
    score
}

fn provider_qualifications(context: &RiskFactorContext) -> u8 {
    let tcc = context.compensation.tcc;
    if tcc <= ELEVATED_PERCENTILE {
        return 0;
    }

    let provider = &context.provider;
    let mut score = 0;
    if provider.years_experience < SENIOR_EXPERIENCE_YEARS {
        score += 1;
    }
    if provider.certifications.is_empty() {
        score += 1;
    } else if tcc > EXCESSIVE_PERCENTILE {
        score += 1;
    }
    if provider.unique_skills.is_empty() && !provider.academic_appointment {
        score += 1;
    }
    score
}

fn regulatory_compliance(context: &RiskFactorContext) -> u8 {
    let flags = &context.compliance;
    let mut score = 0;
    if flags.referral_relationship && !flags.referral_analysis_complete {
        score += 2;
    }
    if !flags.stark_reviewed {
        score += 1;
    }
    if !flags.aks_reviewed {
        score += 1;
    }
    score
}

fn documentation(context: &RiskFactorContext) -> u8 {
    context.documentation.missing_items().len().min(u8::MAX as usize) as u8
}

fn business_case(context: &RiskFactorContext) -> u8 {
    let case = &context.business_case;
    let mut score = 0;
    if case.justification.trim().is_empty() {
        score += 1;
    }
    match case.roi_percent {
        None => score += 1,
        Some(roi) if roi < 0.0 => score += 2,
        Some(_) => {}
    }
    if context.program.strategic_importance == Level::Low
        && context.compensation.tcc > ELEVATED_PERCENTILE
    {
        score += 1;
    }
    score
}

fn quality_below_benchmark(context: &RiskFactorContext) -> bool {
    let practice = &context.practice;
    practice.quality_metric_benchmark > 0.0
        && practice.quality_metric_score < practice.quality_metric_benchmark
}

pub(crate) fn findings(rule: RiskRule, context: &RiskFactorContext) -> Vec<String> {
    let pct = &context.compensation;
    let mut findings = Vec::new();

    match rule {
        RiskRule::CompensationLevel => {
            findings.push(format!(
                "Total cash compensation sits at the {:.1} percentile",
                pct.tcc
            ));
            if pct.tcc > EXCESSIVE_PERCENTILE {
                findings.push(
                    "Total cash compensation exceeds the 90th percentile of market benchmarks"
                        .to_string(),
                );
            } else if pct.tcc > ELEVATED_PERCENTILE {
                findings.push(
                    "Total cash compensation falls between the 75th and 90th percentiles"
                        .to_string(),
                );
            }
            if pct.conversion_factor > EXCESSIVE_PERCENTILE {
                findings.push(format!(
                    "Conversion factor at the {:.1} percentile exceeds the 90th percentile",
                    pct.conversion_factor
                ));
            }
        }
        RiskRule::ProductivityAlignment => {
            findings.push(format!(
                "Compensation at the {:.1} percentile against productivity at the {:.1} percentile",
                pct.tcc, pct.wrvu
            ));
            let gap = pct.tcc - pct.wrvu;
            if gap > MATERIAL_GAP {
                findings.push(format!(
                    "Compensation outpaces productivity by {gap:.1} percentile points"
                ));
            }
            if pct.wrvu < LOW_PRODUCTIVITY_PERCENTILE && pct.tcc > MEDIAN_PERCENTILE {
                findings.push(
                    "wRVU production is below the 25th percentile while pay exceeds the median"
                        .to_string(),
                );
            }
            if quality_below_benchmark(context) {
                findings.push(format!(
                    "Quality metric score {:.1} is below the {:.1} benchmark",
                    context.practice.quality_metric_score,
                    context.practice.quality_metric_benchmark
                ));
            }
        }
        RiskRule::MarketJustification => {
            if pct.tcc <= ELEVATED_PERCENTILE {
                findings.push(
                    "Compensation is within the range supported by general market conditions"
                        .to_string(),
                );
            } else {
                let market = &context.market;
                if market.demand == Level::Low {
                    findings.push("Market demand for the specialty is low".to_string());
                }
                if market.competition == Level::Low {
                    findings.push("Little competition for providers in this market".to_string());
                }
                if market.recruitment_difficulty == Level::Low {
                    findings.push("Recruitment for this specialty is not difficult".to_string());
                }
                if market.cost_of_living_index < NATIONAL_COST_OF_LIVING_INDEX
                    && pct.tcc > EXCESSIVE_PERCENTILE
                {
                    findings.push(format!(
                        "Cost-of-living index {:.0} is below the national average",
                        market.cost_of_living_index
                    ));
                }
                if findings.is_empty() {
                    findings.push(
                        "Market conditions support above-75th-percentile compensation".to_string(),
                    );
                }
            }
        }
        RiskRule::ProviderQualifications => {
            let provider = &context.provider;
            findings.push(format!(
                "{} year(s) of experience, {} certification(s)",
                provider.years_experience,
                provider.certifications.len()
            ));
            if pct.tcc > ELEVATED_PERCENTILE {
                if provider.years_experience < SENIOR_EXPERIENCE_YEARS {
                    findings.push(
                        "Limited experience for compensation above the 75th percentile".to_string(),
                    );
                }
                if provider.certifications.is_empty() {
                    findings.push("No board or subspecialty certifications on file".to_string());
                } else if pct.tcc > EXCESSIVE_PERCENTILE {
                    findings.push(
                        "Certifications present but compensation still exceeds the 90th percentile"
                            .to_string(),
                    );
                }
                if provider.unique_skills.is_empty() && !provider.academic_appointment {
                    findings.push(
                        "No unique skills or academic appointment documented".to_string(),
                    );
                }
            }
        }
        RiskRule::RegulatoryCompliance => {
            let flags = &context.compliance;
            if flags.referral_relationship && !flags.referral_analysis_complete {
                findings.push(
                    "Provider has a referral relationship without a completed referral analysis"
                        .to_string(),
                );
            }
            if !flags.stark_reviewed {
                findings.push("Stark Law exception review not documented".to_string());
            }
            if !flags.aks_reviewed {
                findings.push("Anti-Kickback Statute review not documented".to_string());
            }
            if findings.is_empty() {
                findings.push("Stark and Anti-Kickback reviews documented".to_string());
            }
        }
        RiskRule::Documentation => {
            let missing = context.documentation.missing_items();
            if missing.is_empty() {
                findings.push("FMV documentation file is complete".to_string());
            } else {
                findings.push(format!("Missing documentation: {}", missing.join(", ")));
            }
        }
        RiskRule::BusinessCase => {
            let case = &context.business_case;
            if case.justification.trim().is_empty() {
                findings.push("No written business justification".to_string());
            }
            match case.roi_percent {
                None => findings.push("Return on investment has not been projected".to_string()),
                Some(roi) if roi < 0.0 => {
                    findings.push(format!("Projected return on investment is negative ({roi:.1}%)"))
                }
                Some(roi) => findings.push(format!("Projected return on investment {roi:.1}%")),
            }
            if context.program.strategic_importance == Level::Low
                && pct.tcc > ELEVATED_PERCENTILE
            {
                findings.push(
                    "Low strategic importance does not support elevated compensation".to_string(),
                );
            }
        }
    }

    findings
}

pub(crate) fn recommendations(rule: RiskRule, points: u8, context: &RiskFactorContext) -> Vec<String> {
    let owned = |items: &[&str]| items.iter().map(|item| item.to_string()).collect::<Vec<_>>();

    match rule {
        RiskRule::CompensationLevel => match points {
            0 => owned(&["Retain the market survey sources supporting the compensation level"]),
            1 => owned(&["Document the rationale for above-median compensation in the FMV file"]),
            2 => owned(&[
                "Document the rationale for above-median compensation in the FMV file",
                "Obtain an independent FMV opinion before finalizing the arrangement",
            ]),
            _ => owned(&[
                "Obtain an independent third-party valuation before execution",
                "Escalate the arrangement to the compliance committee",
            ]),
        },
        RiskRule::ProductivityAlignment => match points {
            0 => owned(&["Productivity supports the current compensation level"]),
            1 => owned(&["Reconcile compensation with wRVU production at the annual review"]),
            2 => owned(&[
                "Reconcile compensation with wRVU production at the annual review",
                "Tie a larger share of pay to productivity or quality targets",
            ]),
            _ => owned(&[
                "Restructure pay so it tracks personally performed services",
                "Audit wRVU crediting and quality payments before renewal",
            ]),
        },
        RiskRule::MarketJustification => {
            if points == 0 {
                return owned(&["No additional market documentation required"]);
            }
            let region = if context.market.region.trim().is_empty() {
                "the local market".to_string()
            } else {
                context.market.region.trim().to_string()
            };
            let mut items = owned(&["Document recruitment efforts and competing offers"]);
            if points >= 2 {
                items.push(format!("Benchmark against regional surveys for {region}"));
            }
            items
        }
        RiskRule::ProviderQualifications => match points {
            0 => owned(&["Qualifications on file support the compensation level"]),
            1 => owned(&["Add credentials and skill documentation to the FMV file"]),
            _ => owned(&[
                "Add credentials and skill documentation to the FMV file",
                "Score the provider against the qualification criteria before approval",
            ]),
        },
        RiskRule::RegulatoryCompliance => {
            let flags = &context.compliance;
            if points == 0 {
                return owned(&["Keep compliance review records with the executed agreement"]);
            }
            let mut items = Vec::new();
            if flags.referral_relationship && !flags.referral_analysis_complete {
                items.push(
                    "Complete a referral analysis confirming pay does not vary with referrals"
                        .to_string(),
                );
            }
            if !flags.stark_reviewed {
                items.push("Confirm the arrangement satisfies a Stark Law exception".to_string());
            }
            if !flags.aks_reviewed {
                items.push("Document the Anti-Kickback safe harbor analysis".to_string());
            }
            if points >= MAX_FACTOR_POINTS {
                items.push("Route the arrangement to legal counsel before signature".to_string());
            }
            items
        }
        RiskRule::Documentation => {
            let missing = context.documentation.missing_items();
            if missing.is_empty() {
                return owned(&["No documentation gaps identified"]);
            }
            missing
                .into_iter()
                .map(|item| format!("Obtain the {item} before execution"))
                .collect()
        }
        RiskRule::BusinessCase => match points {
            0 => owned(&["Business case supports the arrangement"]),
            1 => owned(&["Complete the written business justification"]),
            _ => owned(&[
                "Complete the written business justification",
                "Prepare a financial pro forma with projected return on investment",
            ]),
        },
    }
}
