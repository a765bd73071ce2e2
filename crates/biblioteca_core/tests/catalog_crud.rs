use biblioteca_core::db::open_db_in_memory;
use biblioteca_core::{
    AuthorPatch, AuthorRepository, BookPatch, BookRepository, CatalogError, MemberPatch,
    MemberRepository, NewAuthor, NewBook, NewMember, SqliteAuthorRepository, SqliteBookRepository,
    SqliteMemberRepository, ValidationError,
};
use rusqlite::Connection;

#[test]
fn author_create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::new(&conn);

    let created = repo
        .create_author(&NewAuthor {
            name: "Gabriel García Márquez".to_string(),
            nationality: Some("Colombian".to_string()),
        })
        .unwrap();

    let loaded = repo.get_author(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
    assert_eq!(loaded.name, "Gabriel García Márquez");
    assert_eq!(loaded.nationality.as_deref(), Some("Colombian"));
}

#[test]
fn author_create_rejects_blank_name() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::new(&conn);

    let err = repo
        .create_author(&NewAuthor {
            name: "   ".to_string(),
            nationality: None,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::EmptyField {
            entity: "author",
            field: "name"
        })
    ));
}

#[test]
fn author_partial_update_keeps_untouched_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::new(&conn);

    let created = repo
        .create_author(&NewAuthor {
            name: "J. Cortázar".to_string(),
            nationality: Some("Argentine".to_string()),
        })
        .unwrap();

    repo.update_author(
        created.id,
        &AuthorPatch {
            name: Some("Julio Cortázar".to_string()),
            nationality: None,
        },
    )
    .unwrap();

    let loaded = repo.get_author(created.id).unwrap().unwrap();
    assert_eq!(loaded.name, "Julio Cortázar");
    assert_eq!(loaded.nationality.as_deref(), Some("Argentine"));
}

#[test]
fn author_update_requires_at_least_one_field() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::new(&conn);

    let created = repo
        .create_author(&NewAuthor {
            name: "Anonymous".to_string(),
            nationality: None,
        })
        .unwrap();

    let err = repo
        .update_author(created.id, &AuthorPatch::default())
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::EmptyUpdate { entity: "author" })
    ));
}

#[test]
fn author_update_and_delete_report_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAuthorRepository::new(&conn);

    let patch = AuthorPatch {
        name: Some("Ghost".to_string()),
        nationality: None,
    };
    assert!(matches!(
        repo.update_author(4242, &patch).unwrap_err(),
        CatalogError::AuthorNotFound(4242)
    ));
    assert!(matches!(
        repo.delete_author(4242).unwrap_err(),
        CatalogError::AuthorNotFound(4242)
    ));
}

#[test]
fn book_create_requires_existing_author() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::new(&conn);

    let err = repo
        .create_book(&NewBook {
            title: "Orphan Book".to_string(),
            publication_year: Some(1999),
            genre: None,
            author_id: 77,
            available_count: 1,
        })
        .unwrap_err();
    assert!(matches!(err, CatalogError::AuthorNotFound(77)));
}

#[test]
fn book_detail_includes_author_fields() {
    let conn = open_db_in_memory().unwrap();
    let author_id = seed_author(&conn, "Isabel Allende", Some("Chilean"));
    let repo = SqliteBookRepository::new(&conn);

    let created = repo
        .create_book(&NewBook {
            title: "La casa de los espíritus".to_string(),
            publication_year: Some(1982),
            genre: Some("Novel".to_string()),
            author_id,
            available_count: 3,
        })
        .unwrap();

    let detail = repo.get_book(created.id).unwrap().unwrap();
    assert_eq!(detail.title, "La casa de los espíritus");
    assert_eq!(detail.available_count, 3);
    assert_eq!(detail.author_name, "Isabel Allende");
    assert_eq!(detail.author_nationality.as_deref(), Some("Chilean"));

    let listed = repo.list_books().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], detail);
}

#[test]
fn book_update_checks_new_author_and_coalesces_fields() {
    let conn = open_db_in_memory().unwrap();
    let author_id = seed_author(&conn, "Original Author", None);
    let other_author_id = seed_author(&conn, "Second Author", None);
    let repo = SqliteBookRepository::new(&conn);

    let created = repo
        .create_book(&NewBook {
            title: "First Edition".to_string(),
            publication_year: Some(2001),
            genre: Some("Essay".to_string()),
            author_id,
            available_count: 2,
        })
        .unwrap();

    let err = repo
        .update_book(
            created.id,
            &BookPatch {
                author_id: Some(999),
                ..BookPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, CatalogError::AuthorNotFound(999)));

    repo.update_book(
        created.id,
        &BookPatch {
            title: Some("Second Edition".to_string()),
            author_id: Some(other_author_id),
            available_count: Some(5),
            ..BookPatch::default()
        },
    )
    .unwrap();

    let detail = repo.get_book(created.id).unwrap().unwrap();
    assert_eq!(detail.title, "Second Edition");
    assert_eq!(detail.publication_year, Some(2001));
    assert_eq!(detail.genre.as_deref(), Some("Essay"));
    assert_eq!(detail.author_id, other_author_id);
    assert_eq!(detail.available_count, 5);
}

#[test]
fn member_create_assigns_registration_date() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::new(&conn);

    let created = repo
        .create_member(&NewMember {
            name: "Ada Lovelace".to_string(),
            national_id: "12345678A".to_string(),
            phone: Some("+34 600 000 000".to_string()),
            email: "ada@example.org".to_string(),
            address: None,
        })
        .unwrap();

    assert_eq!(created.registered_on, today(&conn));

    let loaded = repo.get_member(created.id).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn member_duplicate_national_id_and_email_are_reported() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::new(&conn);

    repo.create_member(&NewMember {
        name: "First".to_string(),
        national_id: "11111111H".to_string(),
        phone: None,
        email: "first@example.org".to_string(),
        address: None,
    })
    .unwrap();

    let dup_national_id = repo
        .create_member(&NewMember {
            name: "Second".to_string(),
            national_id: "11111111H".to_string(),
            phone: None,
            email: "second@example.org".to_string(),
            address: None,
        })
        .unwrap_err();
    assert!(matches!(
        dup_national_id,
        CatalogError::Duplicate {
            entity: "member",
            field: "national_id"
        }
    ));

    let dup_email = repo
        .create_member(&NewMember {
            name: "Third".to_string(),
            national_id: "22222222J".to_string(),
            phone: None,
            email: "first@example.org".to_string(),
            address: None,
        })
        .unwrap_err();
    assert!(matches!(
        dup_email,
        CatalogError::Duplicate {
            entity: "member",
            field: "email"
        }
    ));

    assert_eq!(repo.list_members().unwrap().len(), 1);
}

#[test]
fn member_update_maps_duplicates_and_rejects_empty_patch() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteMemberRepository::new(&conn);

    let first = repo
        .create_member(&NewMember {
            name: "First".to_string(),
            national_id: "11111111H".to_string(),
            phone: None,
            email: "first@example.org".to_string(),
            address: None,
        })
        .unwrap();
    let second = repo
        .create_member(&NewMember {
            name: "Second".to_string(),
            national_id: "22222222J".to_string(),
            phone: None,
            email: "second@example.org".to_string(),
            address: None,
        })
        .unwrap();

    let err = repo
        .update_member(
            second.id,
            &MemberPatch {
                email: Some("first@example.org".to_string()),
                ..MemberPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Duplicate {
            entity: "member",
            field: "email"
        }
    ));

    let err = repo
        .update_member(first.id, &MemberPatch::default())
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Validation(ValidationError::EmptyUpdate { entity: "member" })
    ));

    repo.update_member(
        first.id,
        &MemberPatch {
            phone: Some("+34 611 111 111".to_string()),
            ..MemberPatch::default()
        },
    )
    .unwrap();
    let loaded = repo.get_member(first.id).unwrap().unwrap();
    assert_eq!(loaded.phone.as_deref(), Some("+34 611 111 111"));
    assert_eq!(loaded.email, "first@example.org");
}

#[test]
fn deleting_an_author_cascades_to_books_and_loans() {
    let conn = open_db_in_memory().unwrap();
    let author_id = seed_author(&conn, "Cascade Author", None);

    let book = SqliteBookRepository::new(&conn)
        .create_book(&NewBook {
            title: "Cascade Book".to_string(),
            publication_year: None,
            genre: None,
            author_id,
            available_count: 1,
        })
        .unwrap();
    let member = SqliteMemberRepository::new(&conn)
        .create_member(&NewMember {
            name: "Cascade Member".to_string(),
            national_id: "33333333P".to_string(),
            phone: None,
            email: "cascade@example.org".to_string(),
            address: None,
        })
        .unwrap();
    conn.execute(
        "INSERT INTO loans (book_id, member_id, loan_date) VALUES (?1, ?2, date('now'));",
        [book.id, member.id],
    )
    .unwrap();

    SqliteAuthorRepository::new(&conn)
        .delete_author(author_id)
        .unwrap();

    assert_eq!(count_rows(&conn, "books"), 0);
    assert_eq!(count_rows(&conn, "loans"), 0);
    assert_eq!(count_rows(&conn, "members"), 1);
}

fn seed_author(conn: &Connection, name: &str, nationality: Option<&str>) -> i64 {
    SqliteAuthorRepository::new(conn)
        .create_author(&NewAuthor {
            name: name.to_string(),
            nationality: nationality.map(str::to_string),
        })
        .unwrap()
        .id
}

fn today(conn: &Connection) -> String {
    conn.query_row("SELECT date('now');", [], |row| row.get(0))
        .unwrap()
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
