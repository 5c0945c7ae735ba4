// End-to-end pipeline over a temp project tree: dump file -> parse -> scan ->
// audit -> Markdown, the same path the CLI takes.

use dumpaudit::audit;
use dumpaudit::parser::DumpParser;
use dumpaudit::report;
use dumpaudit::usage::UsageScanner;
use std::fs;
use std::path::Path;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn full_audit_over_a_temp_project() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(
        root,
        "db/full-dump.sql",
        concat!(
            "SET statement_timeout = 0;\n",
            "CREATE TABLE public.users (\n",
            "    id uuid NOT NULL,\n",
            "    name text,\n",
            "    CONSTRAINT users_pkey PRIMARY KEY (id)\n",
            ");\n",
            "CREATE TABLE public.users_legacy (\n",
            "    id uuid NOT NULL,\n",
            "    name text\n",
            ");\n",
            "CREATE TABLE public.audit_log (\n",
            "    id bigint,\n",
            "    detail text\n",
            ");\n",
            "COPY public.users (id, name) FROM stdin;\n",
            "1\tAlice\n",
            "2\t\\N\n",
            "\\.\n",
            "COPY public.audit_log (id, detail) FROM stdin;\n",
            "7\tline one\\nline two\n",
            "\\.\n",
        ),
    );
    write(
        root,
        "src/api/users.ts",
        "export const q = `SELECT * FROM public.users WHERE id = $1`;\n",
    );
    write(
        root,
        "src/api/admin.ts",
        "await db.query(`INSERT INTO public.users (id, name) VALUES ($1, $2)`);\n",
    );
    write(
        root,
        "src/migrations/001_init.sql",
        "CREATE TABLE public.users (id uuid NOT NULL, name text);\n",
    );

    let dump_path = root.join("db/full-dump.sql");
    let dump = DumpParser::new()
        .parse_file(dump_path.to_str().unwrap(), None)
        .unwrap();

    let tables = dump.table_names();
    assert_eq!(
        tables,
        vec![
            "public.audit_log".to_string(),
            "public.users".to_string(),
            "public.users_legacy".to_string(),
        ]
    );
    assert_eq!(dump.row_count("public.users"), 2);
    assert_eq!(
        dump.data["public.audit_log"][0]["detail"],
        Some("line one\nline two".to_string())
    );
    // Declared but never COPYed: present with an empty dataset.
    assert_eq!(dump.row_count("public.users_legacy"), 0);

    let scanner = UsageScanner::with_default_extensions(vec![root.join("src")]);
    let usage = scanner.scan(&tables, None);
    assert_eq!(usage["public.users"].len(), 3); // two api files + the migration
    assert!(usage["public.users_legacy"].is_empty());
    assert!(usage["public.audit_log"].is_empty());

    let (reads, writes) = scanner.scan_reads_writes(&tables, None);
    let users_ts = root.join("src/api/users.ts").display().to_string();
    let admin_ts = root.join("src/api/admin.ts").display().to_string();
    assert!(reads["public.users"].contains(&users_ts));
    assert!(!writes["public.users"].contains(&users_ts));
    assert!(writes["public.users"].contains(&admin_ts));

    let similar = audit::similar_pairs(&dump, 0.6);
    assert_eq!(similar.len(), 1);
    assert_eq!(similar[0].table_a, "public.users");
    assert_eq!(similar[0].table_b, "public.users_legacy");

    let migrations =
        audit::migration_sources(&tables, &root.join("src/migrations")).unwrap();
    assert_eq!(migrations["public.users"], vec!["001_init.sql".to_string()]);

    let md = report::render_validation(&dump, &usage, Some(&migrations), &similar);
    assert!(md.contains("| public.users | 2 | Yes | Keep (has data and usage) |"));
    assert!(md.contains("| public.audit_log | 1 | No | Review (has data, no code reference) |"));
    assert!(md.contains("| public.users_legacy | 0 | No | Archive candidate (no data, no usage) |"));
    assert!(md.contains("| public.users | public.users_legacy | 100% |"));
    assert!(md.contains("| public.users | 001_init.sql |"));
}
