//! Implements the `Store` trait over the hosted database's REST interface.

use crate::api::Store;
use crate::model::{Amount, CategoryTotal, Expense, User};
use crate::session::Session;
use crate::{Config, Result};
use anyhow::{bail, Context};
use chrono::NaiveDate;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;
use uuid::Uuid;

const EXPENSES: &str = "expenses";
const USERS: &str = "users";
const GROUP_BY_TYPE_FN: &str = "expenses_groupby_type";
const SUM_FN: &str = "sum_all_expenses";
const EXPENSE_COLUMNS: &str = "name,type,date,amount,notes";

/// Talks to the REST interface at `<api_url>/rest/v1/`. Every request carries the project's
/// public API key and the user's access token, so the store only returns the user's own rows.
pub(crate) struct RestStore {
    client: reqwest::Client,
    base: Url,
}

impl RestStore {
    pub(crate) fn new(config: &Config, session: &Session) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(config.api_key()).context("The API key is not a valid header")?,
        );
        let bearer = format!("Bearer {}", session.access_token());
        let mut auth =
            HeaderValue::from_str(&bearer).context("The access token is not a valid header")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Unable to create the HTTP client")?;
        let base = config
            .api_url()
            .join("rest/v1/")
            .context("Unable to build the REST endpoint URL")?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("Unable to build the URL for '{path}'"))
    }

    /// Calls a stored procedure that takes the first day of the month as `date_param`.
    async fn rpc<T>(&self, function: &str, since: NaiveDate) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let url = self.url(&format!("rpc/{function}"))?;
        let body = serde_json::json!({ "date_param": since.format("%Y-%m-%d").to_string() });
        let response = send(self.client.post(url).json(&body), function).await?;
        response
            .json()
            .await
            .with_context(|| format!("Unable to parse the response from '{function}'"))
    }
}

#[async_trait::async_trait]
impl Store for RestStore {
    async fn expenses_since(&self, since: NaiveDate) -> Result<Vec<Expense>> {
        trace!("expenses_since {since}");
        let mut url = self.url(EXPENSES)?;
        url.query_pairs_mut()
            .append_pair("select", EXPENSE_COLUMNS)
            .append_pair("date", &format!("gte.{}", since.format("%Y-%m-%d")))
            .append_pair("order", "date.desc");
        let response = send(self.client.get(url), "fetch expenses").await?;
        response
            .json()
            .await
            .context("Unable to parse the expenses response")
    }

    async fn totals_by_type(&self, since: NaiveDate) -> Result<Vec<CategoryTotal>> {
        trace!("totals_by_type {since}");
        self.rpc(GROUP_BY_TYPE_FN, since).await
    }

    async fn sum_since(&self, since: NaiveDate) -> Result<Option<Amount>> {
        trace!("sum_since {since}");
        self.rpc(SUM_FN, since).await
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<()> {
        trace!("insert_expense {expense:?}");
        if expense.uid.is_none() {
            bail!("An expense must have an owner before it can be stored");
        }
        let url = self.url(EXPENSES)?;
        send(self.client.post(url).json(expense), "insert expense").await?;
        Ok(())
    }

    async fn user(&self, uid: Uuid) -> Result<Option<User>> {
        trace!("user {uid}");
        let mut url = self.url(USERS)?;
        url.query_pairs_mut()
            .append_pair("select", "uid,valid")
            .append_pair("uid", &format!("eq.{uid}"));
        let response = send(
            self.client
                .get(url)
                .header(ACCEPT, HeaderValue::from_static("application/json")),
            "fetch user",
        )
        .await?;
        let users: Vec<User> = response
            .json()
            .await
            .context("Unable to parse the user response")?;
        Ok(users.into_iter().next())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        trace!("insert_user {user:?}");
        let url = self.url(USERS)?;
        send(self.client.post(url).json(user), "insert user").await?;
        Ok(())
    }
}

/// Sends `request` and turns any non-success status into an error that includes the body.
async fn send(request: RequestBuilder, what: &str) -> Result<Response> {
    let response = request
        .send()
        .await
        .with_context(|| format!("Failed to send the '{what}' request"))?;
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());
        bail!("The '{what}' request failed with status {status}: {body}");
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_urls_are_built_under_rest_v1() {
        let env = TestEnv::new().await;
        let store = RestStore::new(&env.config(), &env.session()).unwrap();
        assert_eq!(
            store.url(EXPENSES).unwrap().as_str(),
            "https://demo.example.com/rest/v1/expenses"
        );
        assert_eq!(
            store.url("rpc/sum_all_expenses").unwrap().as_str(),
            "https://demo.example.com/rest/v1/rpc/sum_all_expenses"
        );
    }

    #[tokio::test]
    async fn test_insert_without_owner_is_refused() {
        let env = TestEnv::new().await;
        let store = RestStore::new(&env.config(), &env.session()).unwrap();
        let expense = Expense::new(
            "Lunch",
            crate::model::ExpenseType::Restaurants,
            Amount::new(rust_decimal::Decimal::new(1250, 2)),
            NaiveDate::from_ymd_opt(2025, 10, 2).unwrap(),
            "",
        );
        let err = store.insert_expense(&expense).await.unwrap_err();
        assert!(err.to_string().contains("owner"));
    }
}
