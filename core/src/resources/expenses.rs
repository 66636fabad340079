//! Expenses.

use serde_json::Value;

use crate::client::NokoClient;
use crate::error::{ApiError, ValidationError};
use crate::http::Transport;
use crate::params::{check_range, require, DateInput, IdList, Params};
use crate::routes;

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub user_ids: Option<IdList>,
    pub description: Option<String>,
    pub project_ids: Option<IdList>,
    pub invoice_ids: Option<IdList>,
    pub from: Option<DateInput>,
    pub to: Option<DateInput>,
    pub price_from: Option<f64>,
    pub price_to: Option<f64>,
    pub taxable: Option<bool>,
    pub invoiced: Option<bool>,
}

impl ExpenseFilter {
    pub fn build_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new();
        params.ids("user_ids", self.user_ids.as_ref())?;
        params.text("description", self.description.as_ref());
        params.ids("project_ids", self.project_ids.as_ref())?;
        params.ids("invoice_ids", self.invoice_ids.as_ref())?;

        let from = params.date("from", self.from.as_ref())?;
        let to = params.date("to", self.to.as_ref())?;
        check_range("from", from, "to", to)?;

        let price_from = params.number("price_from", self.price_from)?;
        let price_to = params.number("price_to", self.price_to)?;
        check_range("price_from", price_from, "price_to", price_to)?;

        params.insert_opt("taxable", self.taxable);
        params.insert_opt("invoiced", self.invoiced);
        Ok(params)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseDetails {
    pub date: Option<DateInput>,
    pub project_id: Option<u64>,
    pub price: Option<f64>,
    /// Defaults to the token's owner.
    pub user_id: Option<u64>,
    pub taxable: Option<bool>,
    pub description: Option<String>,
}

impl ExpenseDetails {
    pub fn new(date: impl Into<DateInput>, project_id: u64, price: f64) -> Self {
        Self {
            date: Some(date.into()),
            project_id: Some(project_id),
            price: Some(price),
            ..Self::default()
        }
    }

    /// Parameters for a new expense: `date`, `project_id` and `price` are required.
    pub fn build_create_params(&self) -> Result<Params, ValidationError> {
        require("date", self.date.as_ref())?;
        require("project_id", self.project_id.as_ref())?;
        require("price", self.price.as_ref())?;
        self.build_edit_params()
    }

    pub fn build_edit_params(&self) -> Result<Params, ValidationError> {
        let mut params = Params::new();
        params.date("date", self.date.as_ref())?;
        params.insert_opt("project_id", self.project_id);
        params.number("price", self.price)?;
        params.insert_opt("user_id", self.user_id);
        params.insert_opt("taxable", self.taxable);
        params.text("description", self.description.as_ref());
        Ok(params)
    }
}

impl<T: Transport> NokoClient<T> {
    pub fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Value>, ApiError> {
        let params = filter.build_params()?;
        self.call_list(routes::LIST_EXPENSES, &[], &params)
    }

    pub fn get_expense(&self, expense_id: u64) -> Result<Value, ApiError> {
        self.call_record(routes::GET_EXPENSE, &[expense_id], &Params::new())
    }

    pub fn create_expense(&self, expense: &ExpenseDetails) -> Result<Value, ApiError> {
        let params = expense.build_create_params()?;
        self.call_record(routes::CREATE_EXPENSE, &[], &params)
    }

    pub fn edit_expense(&self, expense_id: u64, changes: &ExpenseDetails) -> Result<Value, ApiError> {
        let params = changes.build_edit_params()?;
        self.call_record(routes::EDIT_EXPENSE, &[expense_id], &params)
    }

    pub fn delete_expense(&self, expense_id: u64) -> Result<(), ApiError> {
        self.call_action(routes::DELETE_EXPENSE, &[expense_id], &Params::new())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::http::HttpMethod;
    use crate::testing::{body_of, client, empty, json_response, page_of, path_of, query_of};

    #[test]
    fn price_range_is_checked() {
        let c = client(Vec::new());
        let filter = ExpenseFilter {
            price_from: Some(50.0),
            price_to: Some(10.0),
            ..ExpenseFilter::default()
        };
        let err = c.list_expenses(&filter).unwrap_err();
        assert_eq!(err.to_string(), "invalid `price_from`: 50 is after `price_to` (10)");

        let filter = ExpenseFilter {
            price_to: Some(f64::INFINITY),
            ..ExpenseFilter::default()
        };
        assert!(c.list_expenses(&filter).is_err());
        assert_eq!(c.transport().calls(), 0);
    }

    #[test]
    fn filter_marshals_dates_and_ids() {
        let c = client(vec![page_of(0..1)]);
        let filter = ExpenseFilter {
            invoice_ids: Some(vec![11u64].into()),
            from: Some("2023-01-01".into()),
            price_from: Some(9.5),
            taxable: Some(true),
            ..ExpenseFilter::default()
        };
        c.list_expenses(&filter).unwrap();
        let query = query_of(&c.transport().last_request());
        assert_eq!(
            &query[..4],
            &[
                ("from".to_string(), "2023-01-01".to_string()),
                ("invoice_ids".to_string(), "11".to_string()),
                ("price_from".to_string(), "9.5".to_string()),
                ("taxable".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn create_expense_requires_price() {
        let c = client(vec![json_response(201, json!({ "id": 5, "price": 12.5 }))]);
        let missing = ExpenseDetails {
            date: Some("2023-08-01".into()),
            project_id: Some(2),
            ..ExpenseDetails::default()
        };
        let err = c.create_expense(&missing).unwrap_err();
        assert_eq!(err.to_string(), "invalid `price`: is required");
        assert_eq!(c.transport().calls(), 0);

        let mut expense = ExpenseDetails::new("2023-08-01", 2, 12.5);
        expense.taxable = Some(false);
        c.create_expense(&expense).unwrap();
        assert_eq!(
            body_of(&c.transport().last_request()),
            json!({ "date": "2023-08-01", "project_id": 2, "price": 12.5, "taxable": false })
        );
    }

    #[test]
    fn edit_get_and_delete() {
        let c = client(vec![
            json_response(200, json!({ "id": 5 })),
            json_response(200, json!({ "id": 5 })),
            empty(204),
        ]);
        let changes = ExpenseDetails {
            description: Some("train".to_string()),
            ..ExpenseDetails::default()
        };
        c.edit_expense(5, &changes).unwrap();
        c.get_expense(5).unwrap();
        c.delete_expense(5).unwrap();

        let requests = c.transport().requests();
        assert_eq!(requests[0].method, HttpMethod::Put);
        assert_eq!(body_of(&requests[0]), json!({ "description": "train" }));
        assert_eq!(path_of(&requests[1]), "/v2/expenses/5");
        assert_eq!(requests[2].method, HttpMethod::Delete);
    }
}
