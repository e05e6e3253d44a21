use diesel::prelude::*;

use super::StoreResult;
use super::models::Account;
use super::schema::accounts;

/// The auth layer only ever needs the credential row for a username; account
/// provisioning happens out of band.
pub fn get_by_username(
	username: &str,
	conn: &mut SqliteConnection,
) -> StoreResult<Option<Account>> {
	let account = accounts::table
		.filter(accounts::username.eq(username))
		.select(Account::as_select())
		.first(conn)
		.optional()?;
	Ok(account)
}

pub fn create(
	username: &str,
	password_hash: &str,
	now: i64,
	conn: &mut SqliteConnection,
) -> StoreResult<Account> {
	let account = diesel::insert_into(accounts::table)
		.values((
			accounts::username.eq(username),
			accounts::password_hash.eq(password_hash),
			accounts::added_on.eq(now),
			accounts::last_updated.eq(now),
		))
		.returning(Account::as_returning())
		.get_result(conn)?;

	Ok(account)
}
