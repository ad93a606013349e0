//! Schema for the remote backend.

const SETUP_SQL: &str = r#"-- CloudKeeper remote schema
create table if not exists public.domains (
  id text primary key,
  data jsonb not null
);

create table if not exists public.logins (
  username text primary key,
  password text not null
);

create table if not exists public.audit_logs (
  id uuid primary key default gen_random_uuid(),
  timestamp timestamptz not null default now(),
  level text not null,
  action text not null,
  details jsonb
);

alter table public.domains enable row level security;
alter table public.logins enable row level security;
alter table public.audit_logs enable row level security;

create policy "Public access" on public.domains for all using (true) with check (true);
create policy "Public read" on public.logins for select using (true);
create policy "Public access" on public.audit_logs for all using (true) with check (true);
"#;

/// SQL that creates the `domains`, `logins` and `audit_logs` tables.
#[must_use]
pub fn setup_sql() -> &'static str {
    SETUP_SQL
}

#[cfg(test)]
mod tests {
    use super::setup_sql;

    #[test]
    fn creates_all_tables() {
        for table in ["public.domains", "public.logins", "public.audit_logs"] {
            assert!(setup_sql().contains(&format!("create table if not exists {table}")));
        }
    }
}
