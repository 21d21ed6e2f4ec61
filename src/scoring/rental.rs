// src/scoring/rental.rs

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Longest loan term the amortization accepts; longer terms are clamped.
pub const MAX_LOAN_TERM_YEARS: u32 = 50;

/// Financing and operating assumptions for the buy-and-hold view.
/// Percentages are whole numbers (20.0 means 20%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalAssumptions {
    pub down_payment_pct: f64,
    pub interest_rate: f64,
    pub loan_term_years: u32,
    pub closing_costs_pct: f64,
    pub property_tax_pct: f64,
    pub insurance_monthly: f64,
    pub hoa_monthly: f64,
    pub maintenance_pct: f64,
    pub vacancy_rate_pct: f64,
    pub management_pct: f64,
}

impl Default for RentalAssumptions {
    fn default() -> Self {
        Self {
            down_payment_pct: 20.0,
            interest_rate: 7.0,
            loan_term_years: 30,
            closing_costs_pct: 3.0,
            property_tax_pct: 1.2,
            insurance_monthly: 150.0,
            hoa_monthly: 0.0,
            maintenance_pct: 1.0,
            vacancy_rate_pct: 5.0,
            management_pct: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RentalGrade {
    APlus,
    A,
    B,
    C,
    D,
}

impl RentalGrade {
    fn classify(cash_on_cash_pct: f64, cap_rate_pct: f64) -> Self {
        if cash_on_cash_pct >= 12.0 && cap_rate_pct >= 8.0 {
            RentalGrade::APlus
        } else if cash_on_cash_pct >= 8.0 && cap_rate_pct >= 6.0 {
            RentalGrade::A
        } else if cash_on_cash_pct >= 5.0 && cap_rate_pct >= 4.0 {
            RentalGrade::B
        } else if cash_on_cash_pct >= 0.0 {
            RentalGrade::C
        } else {
            RentalGrade::D
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RentalGrade::APlus => "A+ Excellent",
            RentalGrade::A => "A Very Good",
            RentalGrade::B => "B Good",
            RentalGrade::C => "C Fair",
            RentalGrade::D => "D Poor",
        }
    }
}

/// Monthly figures are dollars, `_pct` fields are percentages, all rounded
/// to cents / hundredths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentalAssessment {
    pub monthly_rent: f64,
    pub monthly_cash_flow: f64,
    pub cash_on_cash_pct: f64,
    pub cap_rate_pct: f64,

    pub monthly_mortgage: f64,
    pub monthly_operating_expenses: f64,
    pub cash_invested: f64,
    pub annual_noi: f64,
    /// `None` when the vacancy rate leaves no occupied months to cover costs.
    pub break_even_rent: Option<f64>,
    pub meets_one_percent_rule: bool,
    pub grade: RentalGrade,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Monthly principal and interest for a fully amortizing loan.
pub fn monthly_payment(principal: f64, annual_rate_pct: f64, term_years: u32) -> f64 {
    let n = f64::from(term_years.clamp(1, MAX_LOAN_TERM_YEARS) * 12);
    let r = annual_rate_pct / 100.0 / 12.0;
    if r <= 0.0 {
        return principal / n;
    }
    let growth = (1.0 + r).powf(n);
    principal * (r * growth) / (growth - 1.0)
}

/// `None` when there is no positive rent estimate or purchase price.
pub fn assess_rental(
    purchase_price: Option<Decimal>,
    monthly_rent: Option<Decimal>,
    a: &RentalAssumptions,
) -> Option<RentalAssessment> {
    let price = purchase_price?.to_f64().filter(|p| *p > 0.0)?;
    let rent = monthly_rent?.to_f64().filter(|r| *r > 0.0)?;

    let down_payment = price * a.down_payment_pct / 100.0;
    let loan = price - down_payment;
    let closing_costs = price * a.closing_costs_pct / 100.0;
    let cash_invested = down_payment + closing_costs;

    let mortgage = monthly_payment(loan, a.interest_rate, a.loan_term_years);

    let tax = price * a.property_tax_pct / 100.0 / 12.0;
    let maintenance = price * a.maintenance_pct / 100.0 / 12.0;
    let management = rent * a.management_pct / 100.0;
    let vacancy = rent * a.vacancy_rate_pct / 100.0;

    let operating = tax + a.insurance_monthly + a.hoa_monthly + maintenance + management + vacancy;

    let monthly_cash_flow = rent - (operating + mortgage);
    let annual_cash_flow = monthly_cash_flow * 12.0;
    let annual_noi = rent * 12.0 - operating * 12.0;

    let cash_on_cash_pct = if cash_invested > 0.0 {
        annual_cash_flow / cash_invested * 100.0
    } else {
        0.0
    };
    let cap_rate_pct = annual_noi / price * 100.0;

    let fixed_costs = mortgage + tax + a.insurance_monthly + a.hoa_monthly + maintenance + management;
    let occupancy = 1.0 - a.vacancy_rate_pct / 100.0;
    let break_even_rent = (occupancy > 0.0).then(|| round2(fixed_costs / occupancy));

    Some(RentalAssessment {
        monthly_rent: round2(rent),
        monthly_cash_flow: round2(monthly_cash_flow),
        cash_on_cash_pct: round2(cash_on_cash_pct),
        cap_rate_pct: round2(cap_rate_pct),
        monthly_mortgage: round2(mortgage),
        monthly_operating_expenses: round2(operating),
        cash_invested: round2(cash_invested),
        annual_noi: round2(annual_noi),
        break_even_rent,
        meets_one_percent_rule: rent >= price * 0.01,
        grade: RentalGrade::classify(cash_on_cash_pct, cap_rate_pct),
    })
}
