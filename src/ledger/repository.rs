use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use super::models::*;
use super::store::{LedgerStore, RecordOutcome};
use crate::error::{AppError, AppResult};

const CAMPAIGN_COLUMNS: &str = r#"
    id, owner_id, external_campaign_id, title, description,
    goal_amount, raised_amount, payout_account, bank_name, account_number,
    image_url, status, deadline, evidence, created_at, updated_at
"#;

const DONATION_COLUMNS: &str = r#"
    id, reference, campaign_id, external_campaign_id, donor_email,
    display_name, amount, is_anonymous, user_id, created_at
"#;

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn violated_constraint(error: &sqlx::Error) -> Option<&str> {
    match error {
        sqlx::Error::Database(db) => db.constraint(),
        _ => None,
    }
}

/// PostgreSQL ledger
pub struct LedgerRepository {
    pub pool: PgPool,
}

impl LedgerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn begin_tx(&self) -> AppResult<Transaction<'_, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    async fn insert_donation_row(
        tx: &mut Transaction<'_, Postgres>,
        donation: &NewDonation,
    ) -> Result<Option<Donation>, sqlx::Error> {
        // The campaign is resolved inside the insert so the row can never
        // reference a campaign that does not carry this external id.
        let sql = format!(
            r#"
            INSERT INTO donations (
                id, reference, campaign_id, external_campaign_id, donor_email,
                display_name, amount, is_anonymous, user_id
            )
            SELECT $1, $2, c.id, c.external_campaign_id, $4, $5, $6, $7, $8
            FROM campaigns c
            WHERE c.external_campaign_id = $3
            RETURNING {}
            "#,
            DONATION_COLUMNS
        );

        sqlx::query_as::<_, Donation>(&sql)
            .bind(Uuid::new_v4())
            .bind(&donation.reference)
            .bind(donation.external_campaign_id)
            .bind(&donation.donor_email)
            .bind(&donation.display_name)
            .bind(donation.amount)
            .bind(donation.is_anonymous)
            .bind(donation.user_id)
            .fetch_optional(&mut **tx)
            .await
    }
}

#[async_trait]
impl LedgerStore for LedgerRepository {
    // ========== USER OPERATIONS ==========

    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, username, email)
            VALUES ($1, $2, $3, lower($4))
            RETURNING id, full_name, username, email, payout_account, created_at
            "#,
        )
        .bind(user.id)
        .bind(user.full_name)
        .bind(user.username)
        .bind(user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e) == Some("users_pkey") {
                AppError::Conflict("User profile already exists".to_string())
            } else if is_unique_violation(&e) {
                AppError::Conflict("Username or email already taken".to_string())
            } else {
                e.into()
            }
        })?;

        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, full_name, username, email, payout_account, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_user_payout_account(&self, user_id: Uuid, payout_account: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET payout_account = $2
            WHERE id = $1
            RETURNING id, full_name, username, email, payout_account, created_at
            "#,
        )
        .bind(user_id)
        .bind(payout_account)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    // ========== CAMPAIGN OPERATIONS ==========

    async fn insert_campaign(&self, campaign: NewCampaign) -> AppResult<Campaign> {
        let sql = format!(
            r#"
            INSERT INTO campaigns (
                id, owner_id, title, description, goal_amount, payout_account,
                bank_name, account_number, image_url, deadline, evidence
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            CAMPAIGN_COLUMNS
        );

        let campaign = sqlx::query_as::<_, Campaign>(&sql)
            .bind(Uuid::new_v4())
            .bind(campaign.owner_id)
            .bind(campaign.title)
            .bind(campaign.description)
            .bind(campaign.goal_amount)
            .bind(campaign.payout_account)
            .bind(campaign.bank_name)
            .bind(campaign.account_number)
            .bind(campaign.image_url)
            .bind(campaign.deadline)
            .bind(Json(campaign.evidence))
            .fetch_one(&self.pool)
            .await?;

        info!("Campaign persisted: {}", campaign.id);
        Ok(campaign)
    }

    async fn get_campaign(&self, campaign_id: Uuid) -> AppResult<Option<Campaign>> {
        let sql = format!("SELECT {} FROM campaigns WHERE id = $1", CAMPAIGN_COLUMNS);
        let campaign = sqlx::query_as::<_, Campaign>(&sql)
            .bind(campaign_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(campaign)
    }

    async fn list_campaigns(&self) -> AppResult<Vec<Campaign>> {
        let sql = format!(
            "SELECT {} FROM campaigns ORDER BY created_at DESC",
            CAMPAIGN_COLUMNS
        );
        let campaigns = sqlx::query_as::<_, Campaign>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(campaigns)
    }

    async fn activate_campaign(&self, campaign_id: Uuid, external_campaign_id: i64) -> AppResult<Campaign> {
        let sql = format!(
            r#"
            UPDATE campaigns
            SET status = $3, external_campaign_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CAMPAIGN_COLUMNS
        );

        sqlx::query_as::<_, Campaign>(&sql)
            .bind(campaign_id)
            .bind(external_campaign_id)
            .bind(CampaignStatus::Active)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!(
                        "Campaign id {} is already bound to another campaign",
                        external_campaign_id
                    ))
                } else {
                    e.into()
                }
            })?
            .ok_or_else(|| AppError::NotFound("Campaign".to_string()))
    }

    async fn append_evidence(&self, campaign_id: Uuid, items: Vec<Evidence>, cap: usize) -> AppResult<Campaign> {
        let adding = items.len();
        let sql = format!(
            r#"
            UPDATE campaigns
            SET evidence = evidence || $2, updated_at = NOW()
            WHERE id = $1 AND jsonb_array_length(evidence) + $3 <= $4
            RETURNING {}
            "#,
            CAMPAIGN_COLUMNS
        );

        let updated = sqlx::query_as::<_, Campaign>(&sql)
            .bind(campaign_id)
            .bind(Json(items))
            .bind(adding as i32)
            .bind(cap as i32)
            .fetch_optional(&self.pool)
            .await?;

        match updated {
            Some(campaign) => Ok(campaign),
            None => {
                // Either the campaign is gone or the cap guard refused the write
                let current = self
                    .get_campaign(campaign_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Campaign".to_string()))?;
                Err(AppError::LimitExceeded {
                    limit: cap,
                    attempted: current.evidence.len() + adding,
                })
            }
        }
    }

    // ========== DONATION OPERATIONS ==========

    async fn find_donation(&self, reference: &str) -> AppResult<Option<Donation>> {
        let sql = format!("SELECT {} FROM donations WHERE reference = $1", DONATION_COLUMNS);
        let donation = sqlx::query_as::<_, Donation>(&sql)
            .bind(reference)
            .fetch_optional(&self.pool)
            .await?;

        Ok(donation)
    }

    async fn record_donation(&self, donation: NewDonation) -> AppResult<RecordOutcome> {
        let mut tx = self.begin_tx().await?;

        let inserted = match Self::insert_donation_row(&mut tx, &donation).await {
            Ok(Some(row)) => row,
            Ok(None) => {
                tx.rollback().await?;
                return Err(AppError::NotFound(format!(
                    "Campaign with campaign id {}",
                    donation.external_campaign_id
                )));
            }
            Err(e) if is_unique_violation(&e) => {
                // Lost the race to a concurrent reconcile of the same reference
                debug!("Donation {} already recorded (unique violation)", donation.reference);
                tx.rollback().await?;
                return Ok(RecordOutcome::AlreadyRecorded);
            }
            Err(e) => {
                tx.rollback().await?;
                return Err(e.into());
            }
        };

        let result = sqlx::query(
            r#"
            UPDATE campaigns
            SET raised_amount = raised_amount + $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(inserted.campaign_id)
        .bind(inserted.amount)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() != 1 {
            tx.rollback().await?;
            return Err(AppError::Internal(format!(
                "raised amount increment touched {} campaigns",
                result.rows_affected()
            )));
        }

        tx.commit().await?;
        Ok(RecordOutcome::Recorded(inserted))
    }

    async fn list_donations(&self, campaign_id: Uuid) -> AppResult<Vec<Donation>> {
        let sql = format!(
            "SELECT {} FROM donations WHERE campaign_id = $1 ORDER BY created_at DESC",
            DONATION_COLUMNS
        );
        let donations = sqlx::query_as::<_, Donation>(&sql)
            .bind(campaign_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(donations)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
