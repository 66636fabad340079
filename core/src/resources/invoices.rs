//! Invoices.
//!
//! An invoice bundles entries and expenses for billing. How hours are
//! priced is described by a [`RateCalculation`]; each method needs its own
//! rate field, checked before the request is built.

use serde_json::Value;

use crate::client::NokoClient;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;
use crate::params::{check_range, require, wire_enum, DateInput, IdList, Params, TimestampInput};
use crate::resources::entries::EntryFilter;
use crate::resources::expenses::ExpenseFilter;
use crate::routes;

wire_enum! {
    /// Payment state of an invoice.
    InvoiceState for "state" {
        Unpaid => "unpaid",
        AwaitingPayment => "awaiting_payment",
        InProgress => "in_progress",
        Paid => "paid",
        /// Invoices whose payment is not tracked.
        Untracked => "none",
    }
}

wire_enum! {
    /// How an invoice prices its entries.
    RateMethod for "rate_calculation" {
        CustomHourlyRates => "custom_hourly_rates",
        StandardHourlyRate => "standard_hourly_rate",
        FlatRate => "flat_rate",
    }
}

/// Pricing for an invoice's entries.
#[derive(Debug, Clone, PartialEq)]
pub struct RateCalculation {
    pub method: RateMethod,
    pub flat_rate: Option<f64>,
    pub standard_hourly_rate: Option<f64>,
    /// Rate for users without a custom rate of their own.
    pub custom_hourly_rate: Option<f64>,
}

impl RateCalculation {
    pub fn flat_rate(amount: f64) -> Self {
        Self {
            flat_rate: Some(amount),
            ..Self::new(RateMethod::FlatRate)
        }
    }

    pub fn standard_hourly_rate(rate: f64) -> Self {
        Self {
            standard_hourly_rate: Some(rate),
            ..Self::new(RateMethod::StandardHourlyRate)
        }
    }

    pub fn custom_hourly_rates(fallback_rate: f64) -> Self {
        Self {
            custom_hourly_rate: Some(fallback_rate),
            ..Self::new(RateMethod::CustomHourlyRates)
        }
    }

    pub fn new(method: RateMethod) -> Self {
        Self {
            method,
            flat_rate: None,
            standard_hourly_rate: None,
            custom_hourly_rate: None,
        }
    }

    fn to_param(&self) -> Result<Value, ValidationError> {
        let present = match self.method {
            RateMethod::FlatRate => self.flat_rate.is_some(),
            RateMethod::StandardHourlyRate => {
                self.standard_hourly_rate.is_some() || self.custom_hourly_rate.is_some()
            }
            RateMethod::CustomHourlyRates => self.custom_hourly_rate.is_some(),
        };
        if !present {
            let needed = match self.method {
                RateMethod::FlatRate => "`flat_rate`",
                RateMethod::StandardHourlyRate => "`standard_hourly_rate` or `custom_hourly_rate`",
                RateMethod::CustomHourlyRates => "`custom_hourly_rate`",
            };
            return Err(ValidationError::new(
                "rate_calculation",
                format!("{} requires {needed}", self.method),
            ));
        }

        let mut rates = Params::new().with("calculation_method", self.method);
        rates.number("flat_rate", self.flat_rate)?;
        rates.number("standard_hourly_rate", self.standard_hourly_rate)?;
        rates.number("custom_hourly_rate", self.custom_hourly_rate)?;
        Ok(rates.to_json())
    }
}

/// A tax line applied to the invoice total.
#[derive(Debug, Clone, PartialEq)]
pub struct Tax {
    pub name: Option<String>,
    pub percentage: f64,
}

impl Tax {
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: Some(name.into()),
            percentage,
        }
    }

    fn to_param(&self) -> Result<Value, ValidationError> {
        if !self.percentage.is_finite() || self.percentage < 0.0 {
            return Err(ValidationError::new(
                "taxes",
                format!("{} is not a valid percentage", self.percentage),
            ));
        }
        let mut tax = Params::new();
        tax.text("name", self.name.as_ref());
        tax.insert("percentage", self.percentage);
        Ok(tax.to_json())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub state: Option<InvoiceState>,
    pub reference: Option<String>,
    pub invoice_date_from: Option<DateInput>,
    pub invoice_date_to: Option<DateInput>,
    pub project_name: Option<String>,
    pub total_amount_from: Option<f64>,
    pub total_amount_to: Option<f64>,
    pub recipient_details: Option<String>,
    pub project_ids: Option<IdList>,
    pub company_name: Option<String>,
    pub company_details: Option<String>,
    pub description: Option<String>,
    pub footer: Option<String>,
    pub has_online_payment_details: Option<bool>,
    pub has_custom_html: Option<bool>,
    pub show_hours_worked: Option<bool>,
    pub show_full_report: Option<bool>,
    pub show_user_summaries: Option<bool>,
    pub show_project_summaries: Option<bool>,
    pub show_project_name_for_expenses: Option<bool>,
    pub locale: Option<String>,
    pub currency_code: Option<String>,
    pub currency_symbol: Option<String>,
    pub rate_calculation: Option<RateMethod>,
    pub updated_from: Option<TimestampInput>,
    pub updated_to: Option<TimestampInput>,
}

impl InvoiceFilter {
    pub fn build_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new();
        params.insert_opt("state", self.state);
        params.insert_opt("rate_calculation", self.rate_calculation);
        params.ids("project_ids", self.project_ids.as_ref())?;

        let date_from = params.date("invoice_date_from", self.invoice_date_from.as_ref())?;
        let date_to = params.date("invoice_date_to", self.invoice_date_to.as_ref())?;
        check_range("invoice_date_from", date_from, "invoice_date_to", date_to)?;

        let total_from = params.number("total_amount_from", self.total_amount_from)?;
        let total_to = params.number("total_amount_to", self.total_amount_to)?;
        check_range("total_amount_from", total_from, "total_amount_to", total_to)?;

        let updated_from = params.timestamp("updated_from", self.updated_from.as_ref())?;
        let updated_to = params.timestamp("updated_to", self.updated_to.as_ref())?;
        check_range("updated_from", updated_from, "updated_to", updated_to)?;

        for (key, value) in [
            ("reference", &self.reference),
            ("project_name", &self.project_name),
            ("recipient_details", &self.recipient_details),
            ("company_name", &self.company_name),
            ("company_details", &self.company_details),
            ("description", &self.description),
            ("footer", &self.footer),
            ("locale", &self.locale),
            ("currency_code", &self.currency_code),
            ("currency_symbol", &self.currency_symbol),
        ] {
            params.text(key, value.as_ref());
        }
        for (key, value) in [
            ("has_online_payment_details", self.has_online_payment_details),
            ("has_custom_html", self.has_custom_html),
            ("show_hours_worked", self.show_hours_worked),
            ("show_full_report", self.show_full_report),
            ("show_user_summaries", self.show_user_summaries),
            ("show_project_summaries", self.show_project_summaries),
            ("show_project_name_for_expenses", self.show_project_name_for_expenses),
        ] {
            params.insert_opt(key, value);
        }
        Ok(params)
    }
}

/// Fields of an invoice. Edits leave unset fields unchanged.
#[derive(Debug, Clone, Default)]
pub struct InvoiceDetails {
    pub invoice_date: Option<DateInput>,
    pub reference: Option<String>,
    pub project_name: Option<String>,
    pub company_name: Option<String>,
    pub company_details: Option<String>,
    pub recipient_details: Option<String>,
    pub description: Option<String>,
    pub footer: Option<String>,
    pub show_hours_worked: Option<bool>,
    pub show_full_report: Option<bool>,
    pub show_user_summaries: Option<bool>,
    pub show_project_summaries: Option<bool>,
    pub show_project_name_for_expenses: Option<bool>,
    pub rate_calculation: Option<RateCalculation>,
    pub entry_ids: Option<IdList>,
    pub expense_ids: Option<IdList>,
    pub taxes: Option<Vec<Tax>>,
    /// Layout overrides, passed through unchanged.
    pub customization: Option<Value>,
}

impl InvoiceDetails {
    pub fn new(invoice_date: impl Into<DateInput>) -> Self {
        Self {
            invoice_date: Some(invoice_date.into()),
            ..Self::default()
        }
    }

    pub fn build_create_params(&self) -> Result<Params, ValidationError> {
        require("invoice_date", self.invoice_date.as_ref())?;
        self.build_edit_params()
    }

    pub fn build_edit_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new();
        params.date("invoice_date", self.invoice_date.as_ref())?;
        for (key, value) in [
            ("reference", &self.reference),
            ("project_name", &self.project_name),
            ("company_name", &self.company_name),
            ("company_details", &self.company_details),
            ("recipient_details", &self.recipient_details),
            ("description", &self.description),
            ("footer", &self.footer),
        ] {
            params.text(key, value.as_ref());
        }
        for (key, value) in [
            ("show_hours_worked", self.show_hours_worked),
            ("show_full_report", self.show_full_report),
            ("show_user_summaries", self.show_user_summaries),
            ("show_project_summaries", self.show_project_summaries),
            ("show_project_name_for_expenses", self.show_project_name_for_expenses),
        ] {
            params.insert_opt(key, value);
        }
        if let Some(rate) = &self.rate_calculation {
            params.insert("rate_calculation", rate.to_param()?);
        }
        params.ids("entry_ids", self.entry_ids.as_ref())?;
        params.ids("expense_ids", self.expense_ids.as_ref())?;
        if let Some(taxes) = &self.taxes {
            let taxes = taxes.iter().map(Tax::to_param).collect::<Result<Vec<_>, _>>()?;
            params.insert("taxes", Value::Array(taxes));
        }
        if let Some(customization) = &self.customization {
            if !customization.is_object() {
                return Err(ValidationError::new("customization", "must be a JSON object"));
            }
            params.insert("customization", customization.clone());
        }
        Ok(params)
    }
}

impl<T: Transport> NokoClient<T> {
    pub fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_INVOICES, &[], &params)
    }

    pub fn get_invoice(&self, invoice_id: u64) -> Result<Value, ApiError> {
        self.call_record(routes::GET_INVOICE, &[invoice_id], &Params::new())
    }

    pub fn create_invoice(&self, invoice: &InvoiceDetails) -> Result<Value, ApiError> {
        let params = invoice.build_create_params()?;
        self.call_record(routes::CREATE_INVOICE, &[], &params)
    }

    pub fn edit_invoice(&self, invoice_id: u64, changes: &InvoiceDetails) -> Result<Value, ApiError> {
        let params = changes.build_edit_params()?;
        self.call_record(routes::EDIT_INVOICE, &[invoice_id], &params)
    }

    pub fn mark_invoice_as_paid(&self, invoice_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::MARK_INVOICE_PAID, &[invoice_id], &Params::new())
    }

    pub fn mark_invoice_as_unpaid(&self, invoice_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::MARK_INVOICE_UNPAID, &[invoice_id], &Params::new())
    }

    pub fn list_invoice_entries(&self, invoice_id: u64, filter: &EntryFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_INVOICE_ENTRIES, &[invoice_id], &params)
    }

    pub fn list_invoice_expenses(
        &self,
        invoice_id: u64,
        filter: &ExpenseFilter,
    ) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_INVOICE_EXPENSES, &[invoice_id], &params)
    }

    /// Deleting an invoice releases its entries and expenses.
    pub fn delete_invoice(&self, invoice_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DELETE_INVOICE, &[invoice_id], &Params::new())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{body_of, client, empty, json_response, page_of, path_of, query_of};

    #[test]
    fn state_accepts_only_known_values() {
        assert_eq!("none".parse::<InvoiceState>().unwrap(), InvoiceState::Untracked);
        assert_eq!(InvoiceState::AwaitingPayment.as_str(), "awaiting_payment");
        let err = "overdue".parse::<InvoiceState>().unwrap_err();
        assert_eq!(err.field, "state");
        assert_eq!(InvoiceState::ALL.len(), 5);
    }

    #[test]
    fn filter_sends_enum_wire_values() {
        let c = client(vec![page_of(0..1)]);
        let filter = InvoiceFilter {
            state: Some(InvoiceState::InProgress),
            rate_calculation: Some(RateMethod::FlatRate),
            show_full_report: Some(true),
            ..InvoiceFilter::default()
        };
        c.list_invoices(&filter).unwrap();
        let query = query_of(&c.transport().last_request());
        assert!(query.contains(&("state".to_string(), "in_progress".to_string())));
        assert!(query.contains(&("rate_calculation".to_string(), "flat_rate".to_string())));
        assert!(query.contains(&("show_full_report".to_string(), "true".to_string())));
    }

    #[test]
    fn inverted_invoice_date_range_is_rejected() {
        let c = client(Vec::new());
        let filter = InvoiceFilter {
            invoice_date_from: Some("2023-09-01".into()),
            invoice_date_to: Some("2023-08-01".into()),
            ..InvoiceFilter::default()
        };
        let err = c.list_invoices(&filter).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid `invoice_date_from`: 2023-09-01 is after `invoice_date_to` (2023-08-01)"
        );
        assert_eq!(c.transport().calls(), 0);
    }

    #[test]
    fn rate_calculation_needs_its_rate() {
        let missing = [
            RateCalculation::new(RateMethod::FlatRate),
            RateCalculation::new(RateMethod::StandardHourlyRate),
            RateCalculation {
                standard_hourly_rate: Some(80.0),
                ..RateCalculation::new(RateMethod::CustomHourlyRates)
            },
        ];
        for rate in missing {
            let invoice = InvoiceDetails {
                rate_calculation: Some(rate.clone()),
                ..InvoiceDetails::new("2023-08-31")
            };
            let err = invoice.build_create_params().unwrap_err();
            assert_eq!(err.field, "rate_calculation", "{rate:?}");
        }

        let standard_via_custom = RateCalculation {
            custom_hourly_rate: Some(90.0),
            ..RateCalculation::new(RateMethod::StandardHourlyRate)
        };
        assert!(standard_via_custom.to_param().is_ok());
    }

    #[test]
    fn create_invoice_builds_nested_body() {
        let c = client(vec![json_response(201, json!({ "id": 900, "state": "unpaid" }))]);
        let invoice = InvoiceDetails {
            reference: Some("AC-1042".to_string()),
            rate_calculation: Some(RateCalculation::standard_hourly_rate(120.0)),
            entry_ids: Some("1,2".into()),
            taxes: Some(vec![Tax::new("VAT", 20.0)]),
            show_hours_worked: Some(false),
            ..InvoiceDetails::new("2023-08-31")
        };
        c.create_invoice(&invoice).unwrap();

        let request = c.transport().last_request();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            body_of(&request),
            json!({
                "invoice_date": "2023-08-31",
                "reference": "AC-1042",
                "show_hours_worked": false,
                "rate_calculation": {
                    "calculation_method": "standard_hourly_rate",
                    "standard_hourly_rate": 120.0,
                },
                "entry_ids": [1, 2],
                "taxes": [{ "name": "VAT", "percentage": 20.0 }],
            })
        );
    }

    #[test]
    fn create_invoice_requires_a_date() {
        let c = client(Vec::new());
        let err = c.create_invoice(&InvoiceDetails::default()).unwrap_err();
        assert_eq!(err.to_string(), "invalid `invoice_date`: is required");
        assert_eq!(c.transport().calls(), 0);
    }

    #[test]
    fn bad_tax_and_customization_are_rejected() {
        let invoice = InvoiceDetails {
            taxes: Some(vec![Tax::new("VAT", f64::NAN)]),
            ..InvoiceDetails::default()
        };
        assert_eq!(invoice.build_edit_params().unwrap_err().field, "taxes");

        let invoice = InvoiceDetails {
            customization: Some(json!("blue")),
            ..InvoiceDetails::default()
        };
        assert_eq!(invoice.build_edit_params().unwrap_err().field, "customization");
    }

    #[test]
    fn payment_state_actions_and_listings() {
        let c = client(vec![empty(204), empty(204), page_of(0..1), page_of(0..1), empty(204)]);
        c.mark_invoice_as_paid(9).unwrap();
        c.mark_invoice_as_unpaid(9).unwrap();
        c.list_invoice_entries(9, &EntryFilter::default()).unwrap();
        c.list_invoice_expenses(9, &ExpenseFilter::default()).unwrap();
        c.delete_invoice(9).unwrap();

        let paths: Vec<String> = c.transport().requests().iter().map(path_of).collect();
        assert_eq!(
            paths,
            vec![
                "/v2/invoices/9/paid",
                "/v2/invoices/9/unpaid",
                "/v2/invoices/9/entries",
                "/v2/invoices/9/expenses",
                "/v2/invoices/9",
            ]
        );
    }
}
