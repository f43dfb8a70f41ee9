//! Classification fixtures.

use super::*;
use crate::models::{CommandType, DatastoreVendor, ParsedStatement, SqlOperation};

fn classify_text(text: &str) -> ParsedStatement {
    classify(DatastoreVendor::MSSQL, CommandType::Text, text)
}

fn assert_classified(text: &str, expected: &str) {
    assert_eq!(
        classify_text(text).to_string(),
        expected,
        "Failed for statement: {}",
        text
    );
}

#[test]
fn test_select_statements() {
    let test_cases = [
        ("SELECT * FROM MyAwesomeTable", "myawesometable/select"),
        ("select * from [dude]", "dude/select"),
        ("select * from (((dude)))", "dude/select"),
        ("Select *\nfrom MAN\nwhere id = 5", "man/select"),
        ("SELECT * FROM man, dude where dude.id = man.id", "man/select"),
        ("select * from `users`", "users/select"),
        ("select * from \"Users\"", "users/select"),
    ];

    for (text, expected) in test_cases {
        assert_classified(text, expected);
    }
}

#[test]
fn test_comments_are_ignored() {
    assert_classified("/* ignore the comment */\n    select * from dude", "dude/select");
    assert_classified("select *\n    /* ignore the comment */\n    from dude", "dude/select");
    assert_classified("/* test */ select * from test", "test/select");
}

#[test]
fn test_leading_set_clauses_are_stripped() {
    let test_cases = [
        ("set nocount on; select * from dude", "dude/select"),
        ("SET nocount on ; select * from test", "test/select"),
        (
            "set nocount on;select * from test where this in (select * from testing)",
            "test/select",
        ),
        ("/* test */ set nocount on; select * from test", "test/select"),
        ("set test; set test2; select * from test", "test/select"),
    ];

    for (text, expected) in test_cases {
        assert_classified(text, expected);
    }
}

#[test]
fn test_statement_of_only_sets_stays_a_set() {
    let parsed = classify_text("set @FOO=17; set @BAR=18;");
    assert_eq!(parsed.operation, Some(SqlOperation::Set));
    assert_eq!(parsed.model.as_deref(), Some("foo"));
}

#[test]
fn test_dml_statements() {
    let test_cases = [
        ("Update  dude set man = 'yeah' where id = 666", "dude/update"),
        ("INSERT into   cars  select * from man", "cars/insert"),
        ("insert   into test(id, name) values(6, 'Bubba')", "test/insert"),
        ("delete from actors where title = 'The Dude'", "actors/delete"),
        ("delete actors where title = 'The Dude'", "actors/delete"),
        (
            "DELETE FROM [ADI-?].[dbo].[UserSession] WHERE [SessionKey] = @p0",
            "usersession/delete",
        ),
    ];

    for (text, expected) in test_cases {
        assert_classified(text, expected);
    }
}

#[test]
fn test_ddl_and_session_statements() {
    let test_cases = [
        ("create table actors as select * from dudes", "table/create"),
        ("create procedure actors as select * from dudes", "procedure/create"),
        ("DROP INDEX ix_users", "index/drop"),
        ("alter table users add column age int", "table/alter"),
        ("call refresh_stats(1, 2)", "refresh_stats/call"),
        ("SET character_set_results=NULL", "character_set_results/set"),
        ("Declare @ID int", "id/declare"),
    ];

    for (text, expected) in test_cases {
        assert_classified(text, expected);
    }
}

#[test]
fn test_stored_procedure_invocations() {
    let arguments = " @programArea_ID = @p?, @courseTitle = @p?, @eventID = @p?, @courseType = @p?";
    let test_cases = [
        format!("EXEC @RETURN_VALUE = [ClassSearchPublicSite]{}", arguments),
        format!("EXEC [ClassSearchPublicSite]{}", arguments),
        format!("EXECUTE [ClassSearchPublicSite]{}", arguments),
        "EXEC @RTN = [ClassSearchPublicSite]".to_string(),
    ];

    for text in &test_cases {
        assert_classified(text, "classsearchpublicsite/ExecuteProcedure");
    }

    assert_classified("sp_MyProc", "sp_myproc/ExecuteProcedure");
    assert_classified("sp_MyProc ?, ?", "sp_myproc/ExecuteProcedure");
}

#[test]
fn test_command_type_shortcuts() {
    let parsed = classify(DatastoreVendor::MSSQL, CommandType::TableDirect, "MyAwesomeTable");
    assert_eq!(parsed.to_string(), "MyAwesomeTable/select");

    let parsed = classify(
        DatastoreVendor::MSSQL,
        CommandType::StoredProcedure,
        "dbo.MySchema.scalar_getMeSomeData",
    );
    assert_eq!(parsed.to_string(), "dbo.myschema.scalar_getmesomedata/ExecuteProcedure");

    let parsed = classify(
        DatastoreVendor::MSSQL,
        CommandType::StoredProcedure,
        "[DotNetNuke].[sys].[sp_dude]",
    );
    assert_eq!(parsed.to_string(), "dotnetnuke.sys.sp_dude/ExecuteProcedure");

    // Shortcuts look at the raw text only.
    let parsed = classify(
        DatastoreVendor::MSSQL,
        CommandType::TableDirect,
        "/* QueryName: ignored */ users",
    );
    assert_eq!(parsed.model.as_deref(), Some("/* QueryName: ignored */ users"));
}

#[test]
fn test_show_statements() {
    assert_classified("show stuff", "stuff/show");

    let parsed = classify_text(
        "show wow_this_is_a_really_long_name_isnt_it_cmon_man_it_s_crazy_no_way_bruh",
    );
    assert_eq!(parsed.operation, Some(SqlOperation::Show));
    assert_eq!(
        parsed.model.as_deref(),
        Some("wow_this_is_a_really_long_name_isnt_it_cmon_man_it")
    );

    // No charset validation for show.
    assert_classified("SHOW FULL TABLES", "full tables/show");
}

#[test]
fn test_waitfor_statements() {
    assert_classified("WaitFor Delay \"00:00:00.5\"", "time/waitfor");
    assert_classified("WaitFor Time \"08:17:00\"", "time/waitfor");
}

#[test]
fn test_subqueries_and_variables() {
    let parsed = classify_text(
        "SELECT * FROM (SELECT * FROM [dbo].[Account] Where UserId like 'John') as test",
    );
    assert_eq!(parsed.to_string(), "(subquery)/select");

    let parsed = classify_text("SELECT x,y SELECT a,b if a > b");
    assert_eq!(parsed.to_string(), "VARIABLE/select");

    let parsed = classify_text(
        "SELECT Ord.OrderID, Ord.OrderDate, (SELECT MAX(OrdDet.UnitPrice) \
         FROM Northwind.dbo.[Order Details] AS OrdDet WHERE Ord.OrderID = OrdDet.OrderID) \
         AS MaxUnitPrice FROM Northwind.dbo.Orders AS Ord",
    );
    assert_eq!(parsed.to_string(), "order/select");
}

#[test]
fn test_select_variable_parser_alone() {
    let patterns = StatementPatterns::instance();
    let parsed = parse_select_variable(patterns, "select @x from t", None);
    assert_eq!(parsed.map(|p| p.to_string()).as_deref(), Some("(subquery)/select"));

    let parsed = parse_select_variable(patterns, "select @x", None);
    assert_eq!(parsed.map(|p| p.to_string()).as_deref(), Some("VARIABLE/select"));

    // In the full cascade the SELECT ... FROM pattern wins first.
    assert_classified("select @x from t", "t/select");
}

#[test]
fn test_invalid_model_names_become_parse_error() {
    assert_classified("update users/old set x = 1", "parseerror/update");
    assert_classified("insert into [we$ird-name] values (1)", "parseerror/insert");
}

#[test]
fn test_unrecognized_text_is_unparsed() {
    let inputs = [
        "Lorem ipsum dolar sit amet",
        "mystoredprocedure'123'",
        "mystoredprocedure\t'123'",
        "mystoredprocedure\r\n'123'",
        "[mystoredprocedure]123",
        "\"mystoredprocedure\"abc",
        "mystoredprocedure",
        "\n    <h1>Bulkmail Report</h1>\n    Operation started at: 6/15/2010 9:44:10 AM<br>\n",
        "",
    ];

    for text in inputs {
        let parsed = classify_text(text);
        assert_eq!(parsed, ParsedStatement::unparsed(), "Expected no match for: {:?}", text);
        assert_eq!(parsed.operation_name(), "other");
    }
}

#[test]
fn test_query_name_comment_decorates_model() {
    let parsed = classify_text("/* QueryName: Users/ByEmail */ select * from users where email = ?");
    assert_eq!(parsed.model.as_deref(), Some("users - [users|byemail]"));
    assert_eq!(parsed.operation, Some(SqlOperation::Select));

    let parsed = classify_text("/* QueryName: Pause */ waitfor delay '00:00:01'");
    assert_eq!(parsed.model.as_deref(), Some("time"));

    let parsed = classify_text("/*QueryName:Vars*/ select 1");
    assert_eq!(parsed.model.as_deref(), Some("VARIABLE - [Vars]"));
}

#[test]
fn test_agent_prefixed_query_name_comment() {
    let parsed = classify_text("/* NewRelicQueryName: Orders/Recent */ select * from orders");
    assert_eq!(parsed.model.as_deref(), Some("orders - [orders|recent]"));
    assert_eq!(parsed.operation, Some(SqlOperation::Select));

    let parsed = classify_text("/*NewRelicQueryName:Ping*/ select 1");
    assert_eq!(parsed.model.as_deref(), Some("VARIABLE - [Ping]"));
}

#[test]
fn test_query_name_comment_can_be_disabled() {
    let config = SqlConfig::default().with_query_name_comments(false);
    let parsed = classify_with_config(
        &config,
        DatastoreVendor::MySQL,
        CommandType::Text,
        "/* QueryName: Users */ select * from users",
    );
    assert_eq!(parsed.model.as_deref(), Some("users"));
}

#[test]
fn test_is_single_sql_statement() {
    let test_cases = [
        ("SELECT name FROM user", true),
        ("SELECT name FROM user;", true),
        ("SELECT name FROM user;   ", true),
        ("SELECT name FROM user;; \n;", true),
        ("SELECT name FROM user; DELETE FROM user", false),
        ("SELECT name FROM user WHERE name like 'semi ; colon';", false),
        (
            "/* a comment; with a semicolon */ SELECT name FROM user;",
            false,
        ),
    ];

    for (sql, expected) in test_cases {
        assert_eq!(is_single_sql_statement(sql), expected, "Failed for: {}", sql);
    }
}

#[test]
fn test_leading_set_clause_helpers() {
    assert_eq!(strip_leading_set_clauses("set a=1; select 1"), " select 1");
    assert_eq!(strip_leading_set_clauses("SET a=1;SET b=2; select 1"), " select 1");
    assert_eq!(strip_leading_set_clauses("set a=1; set b=2"), "set a=1; set b=2");
    assert_eq!(strip_leading_set_clauses("settings; select 1"), "settings; select 1");
    assert_eq!(strip_leading_set_clauses("select 1; set a=1"), "select 1; set a=1");
}

#[test]
fn test_leading_keyword() {
    assert_eq!(leading_keyword("INSERT into t"), "insert");
    assert_eq!(leading_keyword("exec(foo)"), "exec");
    assert_eq!(leading_keyword("Declare\t@x int"), "declare");
    assert_eq!(leading_keyword("(select 1)"), "(select");
    assert_eq!(leading_keyword("mystoredprocedure"), "mystoredprocedure");
}

#[test]
fn test_operation_vocabulary_is_exposed() {
    let operations = operations();
    assert_eq!(operations.len(), 13);
    assert!(operations.contains(&SqlOperation::ExecuteProcedure));
}
