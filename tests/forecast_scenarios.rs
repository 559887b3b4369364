use finsynth::application::forecast::{ForecastOrchestrator, SalesEnrichment};
use finsynth::application::knowledge::StaticAssumptionsProvider;
use finsynth::domain::errors::ForecastError;
use finsynth::domain::forecast::projector::{EnterpriseProjector, Projector, SmbProjector};
use finsynth::domain::forecast::{
    AssumptionOverrides, Assumptions, EnterpriseProfile, ForecastIntent, ForecastResult,
    ForecastType, LargeOverrides, MonthSnapshot, MonthlyData, RoundingPolicy, SmbOverrides,
    SmbProfile, Timeframe,
};
use std::sync::Arc;

const ALL_POLICIES: [RoundingPolicy; 4] = [
    RoundingPolicy::Unrounded,
    RoundingPolicy::Cents,
    RoundingPolicy::Floor,
    RoundingPolicy::Ceil,
];

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() <= 1e-9 * expected.abs().max(1.0)
}

fn orchestrator(rounding: RoundingPolicy) -> ForecastOrchestrator {
    ForecastOrchestrator::new(
        Arc::new(StaticAssumptionsProvider::new(Assumptions::default())),
        rounding,
    )
}

fn segment(result: &ForecastResult) -> &[MonthSnapshot] {
    match &result.monthly_data {
        Some(MonthlyData::Segment(months)) => months,
        other => panic!("expected segment data, got {:?}", other),
    }
}

#[test]
fn test_scenario_a_enterprise_defaults() {
    let result = orchestrator(RoundingPolicy::Unrounded)
        .compute(
            ForecastIntent::ForecastLargeRevenue,
            Timeframe::new(12).unwrap(),
            &AssumptionOverrides::default(),
        )
        .unwrap();

    assert_eq!(result.forecast_type, ForecastType::LargeCustomerRevenue);
    let months = segment(&result);
    assert_eq!(months.len(), 12);

    assert_eq!(months[0].new_customers, 1.0);
    assert_eq!(months[0].cumulative_customers, 1.0);
    assert!(close(months[0].revenue, 16667.0));

    assert_eq!(months[10].new_customers, 9.0);
    assert!(close(months[11].new_customers, 9.0 * 1.05));

    let summary = result.summary.clone().unwrap();
    let total: f64 = months.iter().map(|m| m.revenue).sum();
    assert!(close(summary.total_revenue, total));
    assert_eq!(summary.final_large_customers, Some(months[11].cumulative_customers));
    assert_eq!(summary.final_smb_customers, None);
}

#[test]
fn test_scenario_b_smb_defaults() {
    let result = orchestrator(RoundingPolicy::Unrounded)
        .compute(
            ForecastIntent::ForecastSmbRevenue,
            Timeframe::new(6).unwrap(),
            &AssumptionOverrides::default(),
        )
        .unwrap();

    let months = segment(&result);
    assert_eq!(months.len(), 6);

    let first = &months[0];
    assert!(close(first.leads.unwrap(), 160.0));
    assert!(close(first.new_customers, 72.0));
    assert!(close(first.cumulative_customers, 72.0));
    assert!(close(first.revenue, 360000.0));

    let second = &months[1];
    assert!(close(second.marketing_spend.unwrap(), 206000.0));
    assert!(close(second.leads.unwrap(), 164.8));
    assert!(close(second.new_customers, 74.16));
    assert!(close(second.churned_customers, 3.6));
    assert!(close(second.cumulative_customers, 142.56));
}

#[test]
fn test_scenario_c_explain_returns_defaults() {
    let orch = orchestrator(RoundingPolicy::Unrounded);
    let result = orch
        .compute_raw("explain_assumptions", 12, &AssumptionOverrides::default())
        .unwrap();

    assert_eq!(result.forecast_type, ForecastType::AssumptionsExplanation);
    assert_eq!(result.assumptions, Assumptions::default());
    assert!(result.monthly_data.is_none());
    assert!(result.summary.is_none());
    assert_eq!(orch.projector_runs(), 0);
}

#[test]
fn test_projector_runs_per_intent() {
    let orch = orchestrator(RoundingPolicy::Unrounded);
    let overrides = AssumptionOverrides::default();
    let timeframe = Timeframe::new(6).unwrap();

    orch.compute(ForecastIntent::ExplainAssumptions, timeframe, &overrides)
        .unwrap();
    assert_eq!(orch.projector_runs(), 0);

    orch.compute(ForecastIntent::ForecastLargeRevenue, timeframe, &overrides)
        .unwrap();
    assert_eq!(orch.projector_runs(), 1);

    orch.compute(ForecastIntent::ForecastSmbRevenue, timeframe, &overrides)
        .unwrap();
    assert_eq!(orch.projector_runs(), 2);

    orch.compute(ForecastIntent::ForecastTotalRevenue, timeframe, &overrides)
        .unwrap();
    assert_eq!(orch.projector_runs(), 4);
}

#[test]
fn test_scenario_d_unknown_intent() {
    let err = orchestrator(RoundingPolicy::Unrounded)
        .compute_raw("forecast_churn", 12, &AssumptionOverrides::default())
        .unwrap_err();
    assert_eq!(
        err,
        ForecastError::UnknownIntent {
            intent: "forecast_churn".to_string()
        }
    );
}

#[test]
fn test_revenue_is_stock_times_arpu_under_every_policy() {
    let assumptions = Assumptions::default();
    for policy in ALL_POLICIES {
        let large = EnterpriseProjector::new(&assumptions.large, policy).project(36);
        let smb = SmbProjector::new(&assumptions.smb, policy).project(36);

        for m in large.iter().chain(smb.iter()) {
            assert!(
                close(m.revenue, m.cumulative_customers * m.arpu),
                "{:?} month {}: {} != {} * {}",
                policy,
                m.month,
                m.revenue,
                m.cumulative_customers,
                m.arpu
            );
        }
    }
}

#[test]
fn test_stock_never_negative_under_heavy_churn() {
    let large = EnterpriseProfile {
        churn_rate: 0.99,
        initial_customers: 500.0,
        ..EnterpriseProfile::default()
    };
    let smb = SmbProfile {
        churn_rate: 0.99,
        marketing_spend: 0.0,
        initial_customers: 1000.0,
        ..SmbProfile::default()
    };

    for policy in ALL_POLICIES {
        let months = EnterpriseProjector::new(&large, policy)
            .project(36)
            .into_iter()
            .chain(SmbProjector::new(&smb, policy).project(36));
        for m in months {
            assert!(m.cumulative_customers >= 0.0);
            assert!(m.revenue >= 0.0);
        }
    }
}

#[test]
fn test_ramp_ignores_growth_then_compounds() {
    let profile = EnterpriseProfile {
        growth_rate: 0.5,
        ..EnterpriseProfile::default()
    };
    let months = EnterpriseProjector::new(&profile, RoundingPolicy::Unrounded).project(20);

    for (m, ramp) in months.iter().zip(profile.onboarding_ramp.iter()) {
        assert_eq!(m.new_customers, *ramp);
    }
    for pair in months[profile.onboarding_ramp.len() - 1..].windows(2) {
        assert!(close(pair[1].new_customers, pair[0].new_customers * 1.5));
    }
}

#[test]
fn test_smb_spend_compounds_before_funnel() {
    let profile = SmbProfile::default();
    let months = SmbProjector::new(&profile, RoundingPolicy::Unrounded).project(24);

    for m in &months {
        let expected_spend = profile.marketing_spend * 1.03_f64.powi(m.month as i32 - 1);
        let spend = m.marketing_spend.unwrap();
        assert!((spend - expected_spend).abs() < 1e-6);
        assert!(close(m.new_customers, spend / profile.cac * profile.conversion_rate));
    }
}

#[test]
fn test_zero_growth_keeps_spend_flat() {
    let profile = SmbProfile {
        growth_rate: 0.0,
        ..SmbProfile::default()
    };
    let months = SmbProjector::new(&profile, RoundingPolicy::Unrounded).project(6);
    assert!(months.iter().all(|m| m.marketing_spend == Some(200000.0)));
    assert!(months.iter().all(|m| close(m.new_customers, 72.0)));
}

#[test]
fn test_projection_is_idempotent() {
    let orch = orchestrator(RoundingPolicy::Unrounded).with_enrichment(SalesEnrichment::default());
    let overrides = AssumptionOverrides::default();
    let first = orch
        .compute(ForecastIntent::ForecastTotalRevenue, Timeframe::new(36).unwrap(), &overrides)
        .unwrap();
    let second = orch
        .compute(ForecastIntent::ForecastTotalRevenue, Timeframe::new(36).unwrap(), &overrides)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_revenue_non_decreasing_under_defaults() {
    let result = orchestrator(RoundingPolicy::Unrounded)
        .compute(
            ForecastIntent::ForecastTotalRevenue,
            Timeframe::new(36).unwrap(),
            &AssumptionOverrides::default(),
        )
        .unwrap();

    let Some(MonthlyData::Combined(months)) = &result.monthly_data else {
        panic!("expected combined data");
    };
    assert_eq!(months.len(), 36);
    for pair in months.windows(2) {
        assert!(pair[1].large_customer_revenue >= pair[0].large_customer_revenue);
        assert!(pair[1].smb_customer_revenue >= pair[0].smb_customer_revenue);
        assert!(pair[1].total_revenue >= pair[0].total_revenue);
    }
}

fn assert_non_decreasing(months: &[MonthSnapshot]) {
    for pair in months.windows(2) {
        assert!(
            pair[1].revenue >= pair[0].revenue,
            "revenue fell from month {} to {}: {} -> {}",
            pair[0].month,
            pair[1].month,
            pair[0].revenue,
            pair[1].revenue
        );
    }
}

#[test]
fn test_revenue_non_decreasing_when_growth_beats_churn() {
    let large = EnterpriseProfile {
        growth_rate: 0.10,
        churn_rate: 0.03,
        ..EnterpriseProfile::default()
    };
    let smb = SmbProfile {
        growth_rate: 0.08,
        churn_rate: 0.02,
        ..SmbProfile::default()
    };
    assert!(large.growth_rate > large.churn_rate);
    assert!(smb.growth_rate > smb.churn_rate);

    assert_non_decreasing(
        &EnterpriseProjector::new(&large, RoundingPolicy::Unrounded).project(36),
    );
    assert_non_decreasing(&SmbProjector::new(&smb, RoundingPolicy::Unrounded).project(36));

    let overrides = AssumptionOverrides {
        smb: SmbOverrides {
            growth_rate: Some(0.08),
            churn_rate: Some(0.02),
            ..SmbOverrides::default()
        },
        ..AssumptionOverrides::default()
    };
    let result = orchestrator(RoundingPolicy::Unrounded)
        .compute(ForecastIntent::ForecastTotalRevenue, Timeframe::new(36).unwrap(), &overrides)
        .unwrap();
    let Some(MonthlyData::Combined(months)) = &result.monthly_data else {
        panic!("expected combined data");
    };
    for pair in months.windows(2) {
        assert!(pair[1].total_revenue >= pair[0].total_revenue);
    }
}

#[test]
fn test_total_revenue_combines_both_segments() {
    let result = orchestrator(RoundingPolicy::Unrounded)
        .with_enrichment(SalesEnrichment::default())
        .compute(
            ForecastIntent::ForecastTotalRevenue,
            Timeframe::new(12).unwrap(),
            &AssumptionOverrides::default(),
        )
        .unwrap();

    let Some(MonthlyData::Combined(months)) = &result.monthly_data else {
        panic!("expected combined data");
    };
    let first = &months[0];
    assert!(close(first.total_revenue, 16667.0 + 360000.0));
    assert_eq!(first.total_revenue_mn, 0.38);
    assert!(close(first.smb_marketing_spend, 200000.0));
    assert_eq!(first.presentation.as_ref().unwrap().sales_people, 1.0);
    // Headcount table has 11 entries; month 12 holds the last one
    assert_eq!(months[11].presentation.as_ref().unwrap().sales_people, 9.0);

    let summary = result.summary.clone().unwrap();
    let large: f64 = months.iter().map(|m| m.large_customer_revenue).sum();
    let smb: f64 = months.iter().map(|m| m.smb_customer_revenue).sum();
    assert!(close(summary.large_customer_revenue.unwrap(), large));
    assert!(close(summary.smb_customer_revenue.unwrap(), smb));
    assert!(close(summary.total_revenue, large + smb));
    assert!(close(
        summary.total_customers,
        months[11].cumulative_large_customers + months[11].cumulative_smb_customers
    ));
}

#[test]
fn test_overrides_apply_without_touching_defaults() {
    let orch = orchestrator(RoundingPolicy::Unrounded);
    let overrides = AssumptionOverrides {
        large: LargeOverrides {
            onboarding_ramp: Some(vec![5.0, 5.0]),
            ..LargeOverrides::default()
        },
        smb: SmbOverrides {
            marketing_spend: Some(300000.0),
            ..SmbOverrides::default()
        },
    };

    let large = orch
        .compute(ForecastIntent::ForecastLargeRevenue, Timeframe::new(3).unwrap(), &overrides)
        .unwrap();
    let months = segment(&large);
    assert_eq!(months[0].new_customers, 5.0);
    assert!(close(months[2].new_customers, 5.0 * 1.05));

    let smb = orch
        .compute(ForecastIntent::ForecastSmbRevenue, Timeframe::new(1).unwrap(), &overrides)
        .unwrap();
    assert!(close(segment(&smb)[0].new_customers, 300000.0 / 1250.0 * 0.45));

    assert_eq!(
        orch.effective_assumptions(&AssumptionOverrides::default()),
        Assumptions::default()
    );
}

#[test]
fn test_rounding_never_stalls_growth() {
    let assumptions = Assumptions::default();
    let floor = EnterpriseProjector::new(&assumptions.large, RoundingPolicy::Floor).project(14);
    // Driver 9 -> 9.45 -> 9.9225 -> 10.418625
    assert_eq!(floor[11].new_customers, 9.0);
    assert_eq!(floor[12].new_customers, 9.0);
    assert_eq!(floor[13].new_customers, 10.0);

    let ceil = EnterpriseProjector::new(&assumptions.large, RoundingPolicy::Ceil).project(12);
    assert_eq!(ceil[11].new_customers, 10.0);

    let cents = SmbProjector::new(&assumptions.smb, RoundingPolicy::Cents).project(2);
    assert_eq!(cents[1].new_customers, 74.16);
}

#[test]
fn test_zero_cac_is_computation_fault() {
    let overrides = AssumptionOverrides {
        smb: SmbOverrides {
            cac: Some(0.0),
            ..SmbOverrides::default()
        },
        ..AssumptionOverrides::default()
    };
    let err = orchestrator(RoundingPolicy::Unrounded)
        .compute(ForecastIntent::ForecastTotalRevenue, Timeframe::new(6).unwrap(), &overrides)
        .unwrap_err();
    assert!(matches!(err, ForecastError::ComputationFault { month: 1, .. }));
}

#[test]
fn test_overflowing_segment_total_is_computation_fault() {
    // Every month stays finite; only the horizon sum overflows
    let overrides = AssumptionOverrides {
        large: LargeOverrides {
            arpu: Some(1e307),
            ..LargeOverrides::default()
        },
        ..AssumptionOverrides::default()
    };
    let orch = orchestrator(RoundingPolicy::Unrounded);
    let assumptions = orch.effective_assumptions(&overrides);
    let months = EnterpriseProjector::new(&assumptions.large, RoundingPolicy::Unrounded).project(6);
    assert!(months.iter().all(|m| m.revenue.is_finite()));

    let err = orch
        .compute(ForecastIntent::ForecastLargeRevenue, Timeframe::new(6).unwrap(), &overrides)
        .unwrap_err();
    match err {
        ForecastError::ComputationFault {
            segment,
            month,
            reason,
        } => {
            assert_eq!(segment, "large_customer");
            assert_eq!(month, 6);
            assert!(reason.contains("total_revenue"));
        }
        other => panic!("expected ComputationFault, got {:?}", other),
    }
}

#[test]
fn test_overflowing_combined_month_is_computation_fault() {
    let overrides = AssumptionOverrides {
        large: LargeOverrides {
            arpu: Some(1.5e308),
            ..LargeOverrides::default()
        },
        smb: SmbOverrides {
            arpu: Some(1e306),
            ..SmbOverrides::default()
        },
    };
    let err = orchestrator(RoundingPolicy::Unrounded)
        .compute(ForecastIntent::ForecastTotalRevenue, Timeframe::new(1).unwrap(), &overrides)
        .unwrap_err();
    assert_eq!(
        err,
        ForecastError::ComputationFault {
            segment: "total".to_string(),
            month: 1,
            reason: "non-finite total_revenue".to_string(),
        }
    );
}
